//! In-memory storage backend.
//!
//! Thread-safe via an interior `RwLock`; designed to be wrapped in `Arc` and
//! shared. Every trait call completes under a single lock acquisition, so a
//! `commit_page` is visible entirely or not at all.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DirectoryStore, PageStore, SectionStore};
use crate::directory::{Group, User};
use crate::error::CoreError;
use crate::page::{Page, PageSummary};
use crate::section::Section;

#[derive(Default)]
struct State {
    users: BTreeMap<String, User>,
    groups: BTreeMap<String, Group>,
    sections: BTreeMap<String, Section>,
    pages: BTreeMap<String, Page>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn insert_new<T: Clone>(
    map: &mut BTreeMap<String, T>,
    entity: &'static str,
    id: &str,
    value: &T,
) -> Result<(), CoreError> {
    if map.contains_key(id) {
        return Err(CoreError::Conflict(format!("{entity} '{id}' already exists")));
    }
    map.insert(id.to_string(), value.clone());
    Ok(())
}

fn replace_existing<T: Clone>(
    map: &mut BTreeMap<String, T>,
    entity: &'static str,
    id: &str,
    value: &T,
) -> Result<(), CoreError> {
    match map.get_mut(id) {
        Some(slot) => {
            *slot = value.clone();
            Ok(())
        }
        None => Err(CoreError::not_found(entity, id)),
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, CoreError> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn insert_user(&self, user: &User) -> Result<(), CoreError> {
        insert_new(&mut self.state.write().await.users, "User", &user.id, user)
    }

    async fn update_user(&self, user: &User) -> Result<(), CoreError> {
        replace_existing(&mut self.state.write().await.users, "User", &user.id, user)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, CoreError> {
        Ok(self.state.write().await.users.remove(id).is_some())
    }

    async fn find_group(&self, id: &str) -> Result<Option<Group>, CoreError> {
        Ok(self.state.read().await.groups.get(id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, CoreError> {
        Ok(self.state.read().await.groups.values().cloned().collect())
    }

    async fn insert_group(&self, group: &Group) -> Result<(), CoreError> {
        insert_new(&mut self.state.write().await.groups, "Group", &group.id, group)
    }

    async fn update_group(&self, group: &Group) -> Result<(), CoreError> {
        replace_existing(&mut self.state.write().await.groups, "Group", &group.id, group)
    }

    async fn delete_group(&self, id: &str) -> Result<bool, CoreError> {
        Ok(self.state.write().await.groups.remove(id).is_some())
    }
}

#[async_trait]
impl SectionStore for MemoryStore {
    async fn find_section(&self, id: &str) -> Result<Option<Section>, CoreError> {
        Ok(self.state.read().await.sections.get(id).cloned())
    }

    async fn list_sections(&self) -> Result<Vec<Section>, CoreError> {
        Ok(self.state.read().await.sections.values().cloned().collect())
    }

    async fn insert_section(&self, section: &Section) -> Result<(), CoreError> {
        insert_new(
            &mut self.state.write().await.sections,
            "Section",
            &section.id,
            section,
        )
    }

    async fn update_section(&self, section: &Section) -> Result<(), CoreError> {
        replace_existing(
            &mut self.state.write().await.sections,
            "Section",
            &section.id,
            section,
        )
    }

    async fn delete_section(&self, id: &str) -> Result<bool, CoreError> {
        Ok(self.state.write().await.sections.remove(id).is_some())
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    async fn load_page(&self, slug: &str) -> Result<Option<Page>, CoreError> {
        Ok(self.state.read().await.pages.get(slug).cloned())
    }

    async fn list_page_summaries(&self) -> Result<Vec<PageSummary>, CoreError> {
        Ok(self
            .state
            .read()
            .await
            .pages
            .values()
            .map(Page::summary)
            .collect())
    }

    async fn list_pages_with_pending(&self) -> Result<Vec<Page>, CoreError> {
        Ok(self
            .state
            .read()
            .await
            .pages
            .values()
            .filter(|p| !p.pending_revisions.is_empty())
            .cloned()
            .collect())
    }

    async fn count_pages_in_section(&self, section_id: &str) -> Result<usize, CoreError> {
        Ok(self
            .state
            .read()
            .await
            .pages
            .values()
            .filter(|p| p.section_id == section_id)
            .count())
    }

    async fn count_pending_in_section(&self, section_id: &str) -> Result<usize, CoreError> {
        Ok(self
            .state
            .read()
            .await
            .pages
            .values()
            .flat_map(|p| &p.pending_revisions)
            .filter(|p| p.section_id == section_id)
            .count())
    }

    async fn commit_page(&self, page: &Page) -> Result<Page, CoreError> {
        let mut state = self.state.write().await;
        let stored_version = state.pages.get(&page.slug).map_or(0, |p| p.row_version);
        if stored_version != page.row_version {
            return Err(CoreError::Conflict(format!(
                "Page '{}' was modified concurrently",
                page.slug
            )));
        }
        let mut committed = page.clone();
        committed.row_version = stored_version + 1;
        state.pages.insert(page.slug.clone(), committed.clone());
        Ok(committed)
    }
}
