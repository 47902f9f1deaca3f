//! Revision workflow engine.
//!
//! Decides, for every read and write against a page, whether the caller may
//! act and whether a write is published directly or queued for review.
//!
//! State of a proposed change:
//!
//! ```text
//! Proposed ──► Published                       (section/page does not require review)
//!    └──────► Pending ──► Approved ──► Published
//!                   └──► Rejected ──► Discarded
//! ```
//!
//! Every mutating operation runs under the page's lock and ends with exactly
//! one `commit_page`; a failure anywhere before that leaves storage untouched.
//! Operations that place content in a section also hold the registry lock
//! shared, so a section cannot be deleted between the check and the commit.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::diff::{diff_lines, DiffLine};
use crate::directory::resolve_groups;
use crate::error::{CoreError, ForbiddenReason};
use crate::locks::PageLocks;
use crate::page::{Approval, Page, PageSummary, PendingRef, PendingRevision, Proposal, Revision};
use crate::permissions::{can_approve, can_read, ensure_approve, ensure_read, ensure_write};
use crate::section::Section;
use crate::store::WikiStore;
use crate::types::{GroupSet, SectionId, Version};
use crate::validation::{validate_content, validate_slug, validate_title};

/// A write request against a page.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub slug: String,
    pub title: String,
    pub content: String,
    /// Target section; defaults to the page's current one, then the configured default.
    pub section_id: Option<SectionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Published,
    Pending,
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub status: SaveStatus,
    pub page: Page,
    /// Set when `status == Published`.
    pub revision: Option<Revision>,
    /// Set when `status == Pending`.
    pub pending: Option<PendingRevision>,
}

/// A pending revision the caller may decide on.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    pub slug: String,
    pub page_title: String,
    pub current_section_id: SectionId,
    pub destination_section_id: SectionId,
    pub head_version: Version,
    pub pending: PendingRevision,
}

pub struct WikiService {
    store: Arc<dyn WikiStore>,
    locks: PageLocks,
    /// Shared by writers that reference a section, exclusive for section deletion.
    registry: RwLock<()>,
    default_section: SectionId,
}

impl WikiService {
    pub fn new(store: Arc<dyn WikiStore>, default_section: impl Into<SectionId>) -> Self {
        Self {
            store,
            locks: PageLocks::new(),
            registry: RwLock::new(()),
            default_section: default_section.into(),
        }
    }

    /// Keeps every section alive until the guard drops. Take before any page lock.
    pub(crate) async fn sections_shared(&self) -> RwLockReadGuard<'_, ()> {
        self.registry.read().await
    }

    /// Waits out in-flight writers; no page or proposal can enter a section while held.
    pub(crate) async fn sections_exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.registry.write().await
    }

    pub fn store(&self) -> &Arc<dyn WikiStore> {
        &self.store
    }

    pub fn default_section(&self) -> &str {
        &self.default_section
    }

    /// Current groups of `user_id`, read fresh from the store.
    pub async fn groups_of(&self, user_id: &str) -> Result<GroupSet, CoreError> {
        resolve_groups(&*self.store, user_id).await
    }

    /// Look up a section a page refers to or a caller targets.
    async fn section(&self, id: &str) -> Result<Section, CoreError> {
        self.store
            .find_section(id)
            .await?
            .ok_or_else(|| CoreError::InvalidSection(id.to_string()))
    }

    async fn existing_page(&self, slug: &str) -> Result<Page, CoreError> {
        self.store
            .load_page(slug)
            .await?
            .ok_or_else(|| CoreError::not_found("Page", slug))
    }

    async fn readable_page(&self, slug: &str, user_id: &str) -> Result<Page, CoreError> {
        let groups = self.groups_of(user_id).await?;
        let page = self.existing_page(slug).await?;
        let section = self.section(&page.section_id).await?;
        ensure_read(&section, &groups)?;
        Ok(page)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Summaries of every page in a section the caller can read.
    pub async fn list_pages(&self, user_id: &str) -> Result<Vec<PageSummary>, CoreError> {
        let groups = self.groups_of(user_id).await?;
        let readable: Vec<SectionId> = self
            .store
            .list_sections()
            .await?
            .into_iter()
            .filter(|s| can_read(s, &groups))
            .map(|s| s.id)
            .collect();
        let mut pages: Vec<PageSummary> = self
            .store
            .list_page_summaries()
            .await?
            .into_iter()
            .filter(|p| readable.contains(&p.section_id))
            .collect();
        pages.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(pages)
    }

    pub async fn get_page(&self, slug: &str, user_id: &str) -> Result<Page, CoreError> {
        self.readable_page(slug, user_id).await
    }

    /// Published chain, newest first.
    pub async fn get_history(&self, slug: &str, user_id: &str) -> Result<Vec<Revision>, CoreError> {
        Ok(self.readable_page(slug, user_id).await?.revisions)
    }

    pub async fn get_revision(
        &self,
        slug: &str,
        version: Version,
        user_id: &str,
    ) -> Result<Revision, CoreError> {
        let page = self.readable_page(slug, user_id).await?;
        page.find_revision(version)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Revision", format!("{slug}@{version}")))
    }

    pub async fn diff_revisions(
        &self,
        slug: &str,
        from: Version,
        to: Version,
        user_id: &str,
    ) -> Result<Vec<DiffLine>, CoreError> {
        let page = self.readable_page(slug, user_id).await?;
        let find = |v: Version| {
            page.find_revision(v)
                .ok_or_else(|| CoreError::not_found("Revision", format!("{slug}@{v}")))
        };
        Ok(diff_lines(&find(from)?.content, &find(to)?.content))
    }

    /// Pending revisions across all pages the caller may approve, oldest first.
    pub async fn list_reviews(&self, user_id: &str) -> Result<Vec<ReviewItem>, CoreError> {
        let groups = self.groups_of(user_id).await?;
        let approvable: Vec<SectionId> = self
            .store
            .list_sections()
            .await?
            .into_iter()
            .filter(|s| can_approve(s, &groups))
            .map(|s| s.id)
            .collect();

        let mut items = Vec::new();
        for page in self.store.list_pages_with_pending().await? {
            for pending in &page.pending_revisions {
                if !approvable.contains(&pending.section_id) {
                    continue;
                }
                items.push(ReviewItem {
                    slug: page.slug.clone(),
                    page_title: page.title.clone(),
                    current_section_id: page.section_id.clone(),
                    destination_section_id: pending.section_id.clone(),
                    head_version: page.head_version(),
                    pending: pending.clone(),
                });
            }
        }
        items.sort_by(|a, b| {
            (a.pending.submitted_at, a.pending.id).cmp(&(b.pending.submitted_at, b.pending.id))
        });
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Save new content for `req.slug`, creating the page on first save.
    ///
    /// Publishes directly unless the target section or the page requires
    /// review, in which case a pending revision is queued and the page's
    /// published title/section stay untouched until approval.
    pub async fn save(&self, user_id: &str, req: SaveRequest) -> Result<SaveOutcome, CoreError> {
        validate_slug(&req.slug)?;
        validate_title(&req.title)?;
        validate_content(&req.content)?;

        let groups = self.groups_of(user_id).await?;
        let _sections = self.sections_shared().await;
        let _guard = self.locks.lock(&req.slug).await;
        let existing = self.store.load_page(&req.slug).await?;
        self.save_locked(existing, user_id, &groups, req).await
    }

    async fn save_locked(
        &self,
        existing: Option<Page>,
        user_id: &str,
        groups: &GroupSet,
        req: SaveRequest,
    ) -> Result<SaveOutcome, CoreError> {
        let target_id = req
            .section_id
            .clone()
            .or_else(|| existing.as_ref().map(|p| p.section_id.clone()))
            .unwrap_or_else(|| self.default_section.clone());
        let target = self.section(&target_id).await?;

        // A move needs write access on the section being left as well.
        if let Some(page) = &existing {
            if page.section_id != target.id {
                let origin = self.section(&page.section_id).await?;
                ensure_write(&origin, groups)
                    .map_err(|_| CoreError::Forbidden(ForbiddenReason::CrossSectionMove))?;
            }
        }
        ensure_write(&target, groups)?;

        let review_required =
            target.review_required || existing.as_ref().is_some_and(|p| p.review_required);
        let mut page = existing
            .unwrap_or_else(|| Page::new(req.slug.clone(), req.title.clone(), target.id.clone()));
        let now = Utc::now();

        if review_required {
            let proposal = Proposal {
                content: req.content,
                title: (page.title != req.title).then_some(req.title),
                section_id: target.id,
                author_id: user_id.to_string(),
            };
            let pending = page.enqueue_pending(proposal, now);
            let page = self.store.commit_page(&page).await?;
            Ok(SaveOutcome {
                status: SaveStatus::Pending,
                page,
                revision: None,
                pending: Some(pending),
            })
        } else {
            page.title = req.title;
            page.section_id = target.id;
            let revision = page.append_revision(req.content, user_id.to_string(), None, now);
            let page = self.store.commit_page(&page).await?;
            Ok(SaveOutcome {
                status: SaveStatus::Published,
                page,
                revision: Some(revision),
                pending: None,
            })
        }
    }

    /// Confirm the caller approves the section the addressed entry was written for.
    async fn authorize_decision(
        &self,
        page: &Page,
        pending: PendingRef,
        groups: &GroupSet,
    ) -> Result<(), CoreError> {
        let section = self.section(&page.pending(pending)?.section_id).await?;
        ensure_approve(&section, groups)
    }

    /// Promote a pending revision into the published chain.
    ///
    /// The author of a proposal can never approve it, whatever their groups.
    pub async fn approve(
        &self,
        slug: &str,
        pending: PendingRef,
        user_id: &str,
    ) -> Result<Page, CoreError> {
        let groups = self.groups_of(user_id).await?;
        let _sections = self.sections_shared().await;
        let _guard = self.locks.lock(slug).await;

        let mut page = self.existing_page(slug).await?;
        if page.pending(pending)?.author_id == user_id {
            return Err(CoreError::Forbidden(ForbiddenReason::SelfApproval));
        }
        self.authorize_decision(&page, pending, &groups).await?;

        let entry = page.dequeue_pending(pending)?;
        if let Some(title) = &entry.title {
            page.title = title.clone();
        }
        if page.is_move(&entry) {
            page.section_id = entry.section_id;
        }
        let now = Utc::now();
        page.append_revision(
            entry.content,
            entry.author_id,
            Some(Approval {
                approver_id: user_id.to_string(),
                approved_at: now,
            }),
            now,
        );
        self.store.commit_page(&page).await
    }

    /// Discard a pending revision without touching the published chain.
    pub async fn reject(
        &self,
        slug: &str,
        pending: PendingRef,
        user_id: &str,
    ) -> Result<Page, CoreError> {
        let groups = self.groups_of(user_id).await?;
        let _guard = self.locks.lock(slug).await;

        let mut page = self.existing_page(slug).await?;
        self.authorize_decision(&page, pending, &groups).await?;
        page.dequeue_pending(pending)?;
        self.store.commit_page(&page).await
    }

    /// Propose the content of `version` as a new save with the page's current
    /// title and section. Goes through the same permission and review gate as
    /// any other save.
    pub async fn revert(
        &self,
        slug: &str,
        version: Version,
        user_id: &str,
    ) -> Result<SaveOutcome, CoreError> {
        let groups = self.groups_of(user_id).await?;
        let _sections = self.sections_shared().await;
        let _guard = self.locks.lock(slug).await;

        let page = self.existing_page(slug).await?;
        let target = page
            .find_revision(version)
            .ok_or_else(|| CoreError::not_found("Revision", format!("{slug}@{version}")))?;
        let req = SaveRequest {
            slug: page.slug.clone(),
            title: page.title.clone(),
            content: target.content.clone(),
            section_id: Some(page.section_id.clone()),
        };
        self.save_locked(Some(page), user_id, &groups, req).await
    }

    /// Set the page-level review override. Requires approver rights on the
    /// page's current section.
    pub async fn set_review_policy(
        &self,
        slug: &str,
        review_required: bool,
        user_id: &str,
    ) -> Result<Page, CoreError> {
        let groups = self.groups_of(user_id).await?;
        let _guard = self.locks.lock(slug).await;

        let mut page = self.existing_page(slug).await?;
        let section = self.section(&page.section_id).await?;
        ensure_approve(&section, &groups)?;
        page.review_required = review_required;
        self.store.commit_page(&page).await
    }
}
