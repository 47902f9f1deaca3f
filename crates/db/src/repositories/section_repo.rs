//! Repository for the `sections` table.

use quire_core::section::Section;
use sqlx::PgPool;

use crate::models::section::SectionRow;

const COLUMNS: &str = "id, title, read_groups, write_groups, approver_groups, review_required";

fn as_vec(groups: &std::collections::BTreeSet<String>) -> Vec<&str> {
    groups.iter().map(String::as_str).collect()
}

pub struct SectionRepo;

impl SectionRepo {
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<SectionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sections WHERE id = $1");
        sqlx::query_as::<_, SectionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<SectionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sections ORDER BY id ASC");
        sqlx::query_as::<_, SectionRow>(&query).fetch_all(pool).await
    }

    /// Returns `false` when the id is already taken.
    pub async fn insert(pool: &PgPool, section: &Section) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO sections
                (id, title, read_groups, write_groups, approver_groups, review_required)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&section.id)
        .bind(&section.title)
        .bind(as_vec(&section.read_groups))
        .bind(as_vec(&section.write_groups))
        .bind(as_vec(&section.approver_groups))
        .bind(section.review_required)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Full replacement of every mutable column.
    pub async fn update(pool: &PgPool, section: &Section) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sections SET
                title = $2,
                read_groups = $3,
                write_groups = $4,
                approver_groups = $5,
                review_required = $6,
                updated_at = now()
             WHERE id = $1",
        )
        .bind(&section.id)
        .bind(&section.title)
        .bind(as_vec(&section.read_groups))
        .bind(as_vec(&section.write_groups))
        .bind(as_vec(&section.approver_groups))
        .bind(section.review_required)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fails with a foreign-key violation while pages still reference the section.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
