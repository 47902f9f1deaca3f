//! PostgreSQL implementation of the engine's storage traits.

use async_trait::async_trait;
use quire_core::directory::{Group, User};
use quire_core::error::CoreError;
use quire_core::page::{Page, PageSummary};
use quire_core::section::Section;
use quire_core::store::{DirectoryStore, PageStore, SectionStore};
use sqlx::PgPool;

use crate::repositories::{CommitResult, GroupRepo, PageRepo, SectionRepo, UserRepo};

/// PostgreSQL unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL foreign key violation.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map a driver error into the engine's taxonomy.
///
/// Constraint violations become `Conflict`; everything else is logged and
/// surfaced as `Storage`.
pub fn classify_sqlx_error(op: &'static str, err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let constraint = db_err.constraint().unwrap_or("unknown");
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                tracing::warn!(op, constraint, "Unique constraint violation");
                return CoreError::Conflict(format!(
                    "Duplicate value violates unique constraint: {constraint}"
                ));
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                tracing::warn!(op, constraint, "Foreign key violation");
                return CoreError::Conflict(format!(
                    "Operation violates reference constraint: {constraint}"
                ));
            }
            _ => {}
        }
    }
    tracing::error!(op, error = %err, "Database error");
    CoreError::Storage(format!("{op} failed"))
}

fn expect_inserted(inserted: bool, entity: &'static str, id: &str) -> Result<(), CoreError> {
    if inserted {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!("{entity} '{id}' already exists")))
    }
}

fn expect_updated(updated: bool, entity: &'static str, id: &str) -> Result<(), CoreError> {
    if updated {
        Ok(())
    } else {
        Err(CoreError::not_found(entity, id))
    }
}

/// Storage backed by a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DirectoryStore for PgStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, CoreError> {
        UserRepo::find_by_id(&self.pool, id)
            .await
            .map(|row| row.map(User::from))
            .map_err(|e| classify_sqlx_error("find_user", e))
    }

    async fn list_users(&self) -> Result<Vec<User>, CoreError> {
        UserRepo::list(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(User::from).collect())
            .map_err(|e| classify_sqlx_error("list_users", e))
    }

    async fn insert_user(&self, user: &User) -> Result<(), CoreError> {
        let inserted = UserRepo::insert(&self.pool, user)
            .await
            .map_err(|e| classify_sqlx_error("insert_user", e))?;
        expect_inserted(inserted, "User", &user.id)
    }

    async fn update_user(&self, user: &User) -> Result<(), CoreError> {
        let updated = UserRepo::update(&self.pool, user)
            .await
            .map_err(|e| classify_sqlx_error("update_user", e))?;
        expect_updated(updated, "User", &user.id)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, CoreError> {
        UserRepo::delete(&self.pool, id)
            .await
            .map_err(|e| classify_sqlx_error("delete_user", e))
    }

    async fn find_group(&self, id: &str) -> Result<Option<Group>, CoreError> {
        GroupRepo::find_by_id(&self.pool, id)
            .await
            .map(|row| row.map(Group::from))
            .map_err(|e| classify_sqlx_error("find_group", e))
    }

    async fn list_groups(&self) -> Result<Vec<Group>, CoreError> {
        GroupRepo::list(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Group::from).collect())
            .map_err(|e| classify_sqlx_error("list_groups", e))
    }

    async fn insert_group(&self, group: &Group) -> Result<(), CoreError> {
        let inserted = GroupRepo::insert(&self.pool, group)
            .await
            .map_err(|e| classify_sqlx_error("insert_group", e))?;
        expect_inserted(inserted, "Group", &group.id)
    }

    async fn update_group(&self, group: &Group) -> Result<(), CoreError> {
        let updated = GroupRepo::update(&self.pool, group)
            .await
            .map_err(|e| classify_sqlx_error("update_group", e))?;
        expect_updated(updated, "Group", &group.id)
    }

    async fn delete_group(&self, id: &str) -> Result<bool, CoreError> {
        GroupRepo::delete(&self.pool, id)
            .await
            .map_err(|e| classify_sqlx_error("delete_group", e))
    }
}

#[async_trait]
impl SectionStore for PgStore {
    async fn find_section(&self, id: &str) -> Result<Option<Section>, CoreError> {
        SectionRepo::find_by_id(&self.pool, id)
            .await
            .map(|row| row.map(Section::from))
            .map_err(|e| classify_sqlx_error("find_section", e))
    }

    async fn list_sections(&self) -> Result<Vec<Section>, CoreError> {
        SectionRepo::list(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Section::from).collect())
            .map_err(|e| classify_sqlx_error("list_sections", e))
    }

    async fn insert_section(&self, section: &Section) -> Result<(), CoreError> {
        let inserted = SectionRepo::insert(&self.pool, section)
            .await
            .map_err(|e| classify_sqlx_error("insert_section", e))?;
        expect_inserted(inserted, "Section", &section.id)
    }

    async fn update_section(&self, section: &Section) -> Result<(), CoreError> {
        let updated = SectionRepo::update(&self.pool, section)
            .await
            .map_err(|e| classify_sqlx_error("update_section", e))?;
        expect_updated(updated, "Section", &section.id)
    }

    async fn delete_section(&self, id: &str) -> Result<bool, CoreError> {
        SectionRepo::delete(&self.pool, id)
            .await
            .map_err(|e| classify_sqlx_error("delete_section", e))
    }
}

#[async_trait]
impl PageStore for PgStore {
    async fn load_page(&self, slug: &str) -> Result<Option<Page>, CoreError> {
        PageRepo::find_by_slug(&self.pool, slug)
            .await
            .map_err(|e| classify_sqlx_error("load_page", e))
    }

    async fn list_page_summaries(&self) -> Result<Vec<PageSummary>, CoreError> {
        PageRepo::list_summaries(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(PageSummary::from).collect())
            .map_err(|e| classify_sqlx_error("list_page_summaries", e))
    }

    async fn list_pages_with_pending(&self) -> Result<Vec<Page>, CoreError> {
        let slugs = PageRepo::slugs_with_pending(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("list_pages_with_pending", e))?;
        let mut pages = Vec::with_capacity(slugs.len());
        for slug in slugs {
            // A page may lose its last pending entry between the two reads.
            if let Some(page) = self.load_page(&slug).await? {
                if !page.pending_revisions.is_empty() {
                    pages.push(page);
                }
            }
        }
        Ok(pages)
    }

    async fn count_pages_in_section(&self, section_id: &str) -> Result<usize, CoreError> {
        let count = PageRepo::count_in_section(&self.pool, section_id)
            .await
            .map_err(|e| classify_sqlx_error("count_pages_in_section", e))?;
        usize::try_from(count).map_err(|_| CoreError::Internal(format!("Negative count {count}")))
    }

    async fn count_pending_in_section(&self, section_id: &str) -> Result<usize, CoreError> {
        let count = PageRepo::count_pending_in_section(&self.pool, section_id)
            .await
            .map_err(|e| classify_sqlx_error("count_pending_in_section", e))?;
        usize::try_from(count).map_err(|_| CoreError::Internal(format!("Negative count {count}")))
    }

    async fn commit_page(&self, page: &Page) -> Result<Page, CoreError> {
        let result = PageRepo::commit(&self.pool, page)
            .await
            .map_err(|e| classify_sqlx_error("commit_page", e))?;
        match result {
            CommitResult::Committed(row_version) => {
                tracing::debug!(
                    slug = %page.slug,
                    row_version,
                    head_version = page.head_version(),
                    pending = page.pending_revisions.len(),
                    "Page committed"
                );
                let mut committed = page.clone();
                committed.row_version = row_version;
                Ok(committed)
            }
            CommitResult::Stale => {
                tracing::warn!(slug = %page.slug, "Stale page commit rejected");
                Err(CoreError::Conflict(format!(
                    "Page '{}' was modified concurrently",
                    page.slug
                )))
            }
        }
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("health_check", e))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn non_database_errors_are_sanitized_storage_errors() {
        let err = classify_sqlx_error("load_page", sqlx::Error::PoolTimedOut);
        assert_matches!(err, CoreError::Storage(msg) if msg == "load_page failed");
    }

    #[test]
    fn missing_row_on_update_is_not_found() {
        assert_matches!(
            expect_updated(false, "Section", "eng"),
            Err(CoreError::NotFound { entity: "Section", .. })
        );
        assert!(expect_updated(true, "Section", "eng").is_ok());
    }

    #[test]
    fn taken_id_on_insert_is_conflict() {
        assert_matches!(
            expect_inserted(false, "User", "u1"),
            Err(CoreError::Conflict(msg)) if msg.contains("u1")
        );
    }
}
