//! Repository for the `groups` table.

use quire_core::directory::Group;
use sqlx::PgPool;

use crate::models::directory::GroupRow;

const COLUMNS: &str = "id, permissions";

pub struct GroupRepo;

impl GroupRepo {
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<GroupRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE id = $1");
        sqlx::query_as::<_, GroupRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<GroupRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups ORDER BY id ASC");
        sqlx::query_as::<_, GroupRow>(&query).fetch_all(pool).await
    }

    /// Returns `false` when the id is already taken.
    pub async fn insert(pool: &PgPool, group: &Group) -> Result<bool, sqlx::Error> {
        let permissions: Vec<&str> = group.permissions.iter().map(String::as_str).collect();
        let result = sqlx::query(
            "INSERT INTO groups (id, permissions) VALUES ($1, $2)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&group.id)
        .bind(&permissions)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update(pool: &PgPool, group: &Group) -> Result<bool, sqlx::Error> {
        let permissions: Vec<&str> = group.permissions.iter().map(String::as_str).collect();
        let result = sqlx::query(
            "UPDATE groups SET permissions = $2, updated_at = now() WHERE id = $1",
        )
        .bind(&group.id)
        .bind(&permissions)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
