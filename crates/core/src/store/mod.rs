//! Storage abstraction.
//!
//! The engine never touches a database directly. Backends implement the three
//! traits below; [`WikiStore`] is blanket-implemented for anything that
//! implements all of them so services can hold an `Arc<dyn WikiStore>`.
//!
//! Page writes are per-page transactional: [`PageStore::commit_page`] lands the
//! whole aggregate or nothing.

pub mod memory;

use async_trait::async_trait;

use crate::directory::{Group, User};
use crate::error::CoreError;
use crate::page::{Page, PageSummary};
use crate::section::Section;

/// Users and groups.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<User>, CoreError>;
    async fn list_users(&self) -> Result<Vec<User>, CoreError>;
    /// Fails with `Conflict` when the id is taken.
    async fn insert_user(&self, user: &User) -> Result<(), CoreError>;
    /// Fails with `NotFound` when the id is unknown.
    async fn update_user(&self, user: &User) -> Result<(), CoreError>;
    /// Returns `false` when nothing was deleted.
    async fn delete_user(&self, id: &str) -> Result<bool, CoreError>;

    async fn find_group(&self, id: &str) -> Result<Option<Group>, CoreError>;
    async fn list_groups(&self) -> Result<Vec<Group>, CoreError>;
    async fn insert_group(&self, group: &Group) -> Result<(), CoreError>;
    async fn update_group(&self, group: &Group) -> Result<(), CoreError>;
    async fn delete_group(&self, id: &str) -> Result<bool, CoreError>;
}

/// Section registry persistence.
#[async_trait]
pub trait SectionStore: Send + Sync {
    async fn find_section(&self, id: &str) -> Result<Option<Section>, CoreError>;
    async fn list_sections(&self) -> Result<Vec<Section>, CoreError>;
    async fn insert_section(&self, section: &Section) -> Result<(), CoreError>;
    async fn update_section(&self, section: &Section) -> Result<(), CoreError>;
    async fn delete_section(&self, id: &str) -> Result<bool, CoreError>;
}

/// Page and revision persistence.
#[async_trait]
pub trait PageStore: Send + Sync {
    async fn load_page(&self, slug: &str) -> Result<Option<Page>, CoreError>;

    async fn list_page_summaries(&self) -> Result<Vec<PageSummary>, CoreError>;

    /// Every page with at least one pending revision.
    async fn list_pages_with_pending(&self) -> Result<Vec<Page>, CoreError>;

    /// Number of pages whose current section is `section_id`.
    async fn count_pages_in_section(&self, section_id: &str) -> Result<usize, CoreError>;

    /// Number of pending revisions that would publish into `section_id`.
    async fn count_pending_in_section(&self, section_id: &str) -> Result<usize, CoreError>;

    /// Atomically persist the whole aggregate.
    ///
    /// `page.row_version` must equal the stored value (`0` for a page that was
    /// never committed), otherwise the call fails with `Conflict` and nothing is
    /// written. Returns the page carrying its new `row_version`.
    async fn commit_page(&self, page: &Page) -> Result<Page, CoreError>;

    /// Cheap liveness probe for health checks.
    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

pub trait WikiStore: DirectoryStore + SectionStore + PageStore {}

impl<T: DirectoryStore + SectionStore + PageStore> WikiStore for T {}
