//! Repository for the `users` table.

use quire_core::directory::User;
use sqlx::PgPool;

use crate::models::directory::UserRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, groups, password_hash";

pub struct UserRepo;

impl UserRepo {
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all users ordered by id.
    pub async fn list(pool: &PgPool) -> Result<Vec<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY id ASC");
        sqlx::query_as::<_, UserRow>(&query).fetch_all(pool).await
    }

    /// Insert a user. Returns `false` when the id is already taken.
    pub async fn insert(pool: &PgPool, user: &User) -> Result<bool, sqlx::Error> {
        let groups: Vec<&str> = user.groups.iter().map(String::as_str).collect();
        let result = sqlx::query(
            "INSERT INTO users (id, name, groups, password_hash)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&groups)
        .bind(&user.password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace name, groups, and password hash. Returns `false` when the id is unknown.
    pub async fn update(pool: &PgPool, user: &User) -> Result<bool, sqlx::Error> {
        let groups: Vec<&str> = user.groups.iter().map(String::as_str).collect();
        let result = sqlx::query(
            "UPDATE users SET name = $2, groups = $3, password_hash = $4, updated_at = now()
             WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&groups)
        .bind(&user.password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
