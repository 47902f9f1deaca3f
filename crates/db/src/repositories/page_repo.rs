//! Repository for the `pages`, `revisions`, and `pending_revisions` tables.
//!
//! A page is read and written as one aggregate. [`PageRepo::commit`] is the
//! only write path and runs in a single transaction.

use quire_core::page::Page;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::page::{assemble, PageRow, PageSummaryRow, PendingRow, RevisionRow};

const PAGE_COLUMNS: &str = "slug, title, section_id, review_required, row_version";

const REVISION_COLUMNS: &str =
    "page_slug, version, content, author_id, created_at, approved_by, approved_at";

const PENDING_COLUMNS: &str =
    "id, page_slug, content, title, section_id, author_id, submitted_at";

/// Outcome of [`PageRepo::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResult {
    /// Written; carries the new `row_version`.
    Committed(i64),
    /// The stored `row_version` no longer matches. Nothing was written.
    Stale,
}

pub struct PageRepo;

impl PageRepo {
    /// Load the full aggregate: revisions newest first, pending in FIFO order.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = $1");
        let Some(row) = sqlx::query_as::<_, PageRow>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let query = format!(
            "SELECT {REVISION_COLUMNS} FROM revisions WHERE page_slug = $1 ORDER BY version DESC"
        );
        let revisions = sqlx::query_as::<_, RevisionRow>(&query)
            .bind(slug)
            .fetch_all(pool)
            .await?;

        let query = format!(
            "SELECT {PENDING_COLUMNS} FROM pending_revisions
             WHERE page_slug = $1
             ORDER BY submitted_at ASC, id ASC"
        );
        let pending = sqlx::query_as::<_, PendingRow>(&query)
            .bind(slug)
            .fetch_all(pool)
            .await?;

        Ok(Some(assemble(row, revisions, pending)))
    }

    /// Every page with its head revision and pending count, ordered by slug.
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<PageSummaryRow>, sqlx::Error> {
        sqlx::query_as::<_, PageSummaryRow>(
            "SELECT p.slug, p.title, p.section_id,
                    h.created_at AS updated_at,
                    h.author_id,
                    h.version AS latest_version,
                    (SELECT COUNT(*) FROM pending_revisions pr WHERE pr.page_slug = p.slug)
                        AS pending_count
             FROM pages p
             LEFT JOIN LATERAL (
                 SELECT version, author_id, created_at
                 FROM revisions r
                 WHERE r.page_slug = p.slug
                 ORDER BY version DESC
                 LIMIT 1
             ) h ON true
             ORDER BY p.slug ASC",
        )
        .fetch_all(pool)
        .await
    }

    /// Slugs of pages with at least one pending revision.
    pub async fn slugs_with_pending(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT page_slug FROM pending_revisions ORDER BY page_slug ASC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn count_in_section(pool: &PgPool, section_id: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pages WHERE section_id = $1")
            .bind(section_id)
            .fetch_one(pool)
            .await
    }

    pub async fn count_pending_in_section(
        pool: &PgPool,
        section_id: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pending_revisions WHERE section_id = $1")
            .bind(section_id)
            .fetch_one(pool)
            .await
    }

    /// Persist the aggregate in one transaction.
    ///
    /// The page row is locked with `FOR UPDATE` and its `row_version` compared
    /// against `page.row_version` (`0` for a page never stored). Revisions above
    /// the stored head are inserted; stored revisions are never rewritten.
    /// Pending rows absent from `page` are deleted and new ones inserted.
    pub async fn commit(pool: &PgPool, page: &Page) -> Result<CommitResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let stored: Option<i64> =
            sqlx::query_scalar("SELECT row_version FROM pages WHERE slug = $1 FOR UPDATE")
                .bind(&page.slug)
                .fetch_optional(&mut *tx)
                .await?;

        if stored.unwrap_or(0) != page.row_version {
            tx.rollback().await?;
            return Ok(CommitResult::Stale);
        }

        let new_version: i64 = match stored {
            Some(_) => {
                sqlx::query_scalar(
                    "UPDATE pages SET
                        title = $2,
                        section_id = $3,
                        review_required = $4,
                        row_version = row_version + 1,
                        updated_at = now()
                     WHERE slug = $1
                     RETURNING row_version",
                )
                .bind(&page.slug)
                .bind(&page.title)
                .bind(&page.section_id)
                .bind(page.review_required)
                .fetch_one(&mut *tx)
                .await?
            }
            // A concurrent first insert surfaces as a unique violation on `slug`.
            None => {
                sqlx::query_scalar(
                    "INSERT INTO pages (slug, title, section_id, review_required, row_version)
                     VALUES ($1, $2, $3, $4, 1)
                     RETURNING row_version",
                )
                .bind(&page.slug)
                .bind(&page.title)
                .bind(&page.section_id)
                .bind(page.review_required)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let head: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0) FROM revisions WHERE page_slug = $1",
        )
        .bind(&page.slug)
        .fetch_one(&mut *tx)
        .await?;

        for rev in page.revisions.iter().filter(|r| r.version > head) {
            sqlx::query(
                "INSERT INTO revisions
                    (page_slug, version, content, author_id, created_at, approved_by, approved_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(&page.slug)
            .bind(rev.version)
            .bind(&rev.content)
            .bind(&rev.author_id)
            .bind(rev.created_at)
            .bind(&rev.approved_by)
            .bind(rev.approved_at)
            .execute(&mut *tx)
            .await?;
        }

        let keep: Vec<Uuid> = page.pending_revisions.iter().map(|p| p.id).collect();
        sqlx::query("DELETE FROM pending_revisions WHERE page_slug = $1 AND NOT (id = ANY($2))")
            .bind(&page.slug)
            .bind(&keep)
            .execute(&mut *tx)
            .await?;

        for pending in &page.pending_revisions {
            sqlx::query(
                "INSERT INTO pending_revisions
                    (id, page_slug, content, title, section_id, author_id, submitted_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(pending.id)
            .bind(&page.slug)
            .bind(&pending.content)
            .bind(&pending.title)
            .bind(&pending.section_id)
            .bind(&pending.author_id)
            .bind(pending.submitted_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(CommitResult::Committed(new_version))
    }
}
