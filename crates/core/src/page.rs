//! Page aggregate: the published revision chain and the pending queue.
//!
//! All mutation of a page's history goes through the methods here. They run on
//! an in-memory copy loaded under the page lock; the result is persisted with
//! a single [`crate::store::PageStore::commit_page`] call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{PendingId, SectionId, Timestamp, UserId, Version};

/// An immutable, versioned snapshot of page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub version: Version,
    pub content: String,
    /// Author of the content (not the approver).
    pub author_id: UserId,
    pub created_at: Timestamp,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<Timestamp>,
}

/// Approval metadata recorded on a revision that passed review.
#[derive(Debug, Clone)]
pub struct Approval {
    pub approver_id: UserId,
    pub approved_at: Timestamp,
}

/// A proposed change awaiting an approver decision. Has no version until approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRevision {
    pub id: PendingId,
    pub content: String,
    /// Set when the proposal renames the page.
    pub title: Option<String>,
    /// Section the proposal publishes into, resolved when it was submitted.
    pub section_id: SectionId,
    pub author_id: UserId,
    pub submitted_at: Timestamp,
}

/// Input for [`Page::enqueue_pending`].
#[derive(Debug, Clone)]
pub struct Proposal {
    pub content: String,
    pub title: Option<String>,
    pub section_id: SectionId,
    pub author_id: UserId,
}

/// Addresses one entry of a page's pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRef {
    /// Stable id assigned at enqueue time.
    Id(PendingId),
    /// Position in the FIFO queue. Only meaningful against the queue the
    /// caller just read; prefer [`PendingRef::Id`].
    Index(usize),
}

impl FromStr for PendingRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = Uuid::parse_str(s) {
            return Ok(PendingRef::Id(id));
        }
        s.parse::<usize>().map(PendingRef::Index).map_err(|_| {
            CoreError::Validation(format!(
                "'{s}' is neither a pending revision id nor a queue index"
            ))
        })
    }
}

impl fmt::Display for PendingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingRef::Id(id) => write!(f, "{id}"),
            PendingRef::Index(idx) => write!(f, "#{idx}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Unique, immutable identity.
    pub slug: String,
    pub title: String,
    pub section_id: SectionId,
    /// Page-level override forcing review even when the section does not.
    #[serde(default)]
    pub review_required: bool,
    /// Published chain, newest first.
    #[serde(default)]
    pub revisions: Vec<Revision>,
    /// FIFO queue of proposals.
    #[serde(default)]
    pub pending_revisions: Vec<PendingRevision>,
    /// Optimistic-concurrency token maintained by the store. `0` = never stored.
    #[serde(skip)]
    pub row_version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Published,
    /// No published revision yet; may still have pending proposals.
    Unpublished,
}

/// Listing entry. `updated_at`/`author_id`/`latest_version` are `None` while
/// the page is unpublished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub slug: String,
    pub title: String,
    pub section_id: SectionId,
    pub updated_at: Option<Timestamp>,
    pub author_id: Option<UserId>,
    pub latest_version: Option<Version>,
    pub pending_count: usize,
}

/// A page as returned to callers, with the derived head revision.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    #[serde(flatten)]
    pub page: Page,
    pub current_revision: Option<Revision>,
    pub status: PageStatus,
}

impl Page {
    /// Empty shell for a slug that has never been saved.
    pub fn new(slug: impl Into<String>, title: impl Into<String>, section_id: SectionId) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            section_id,
            review_required: false,
            revisions: Vec::new(),
            pending_revisions: Vec::new(),
            row_version: 0,
        }
    }

    /// Head of the published chain.
    pub fn current_revision(&self) -> Option<&Revision> {
        self.revisions.first()
    }

    /// Version of the head revision, `0` when unpublished.
    pub fn head_version(&self) -> Version {
        self.current_revision().map_or(0, |r| r.version)
    }

    pub fn status(&self) -> PageStatus {
        if self.revisions.is_empty() {
            PageStatus::Unpublished
        } else {
            PageStatus::Published
        }
    }

    pub fn find_revision(&self, version: Version) -> Option<&Revision> {
        self.revisions.iter().find(|r| r.version == version)
    }

    /// Publish new content. The version is assigned now (head + 1), not at
    /// proposal time.
    pub fn append_revision(
        &mut self,
        content: String,
        author_id: UserId,
        approval: Option<Approval>,
        now: Timestamp,
    ) -> Revision {
        let (approved_by, approved_at) = match approval {
            Some(a) => (Some(a.approver_id), Some(a.approved_at)),
            None => (None, None),
        };
        let revision = Revision {
            version: self.head_version() + 1,
            content,
            author_id,
            created_at: now,
            approved_by,
            approved_at,
        };
        self.revisions.insert(0, revision.clone());
        revision
    }

    pub fn enqueue_pending(&mut self, proposal: Proposal, now: Timestamp) -> PendingRevision {
        let pending = PendingRevision {
            id: Uuid::now_v7(),
            content: proposal.content,
            title: proposal.title,
            section_id: proposal.section_id,
            author_id: proposal.author_id,
            submitted_at: now,
        };
        self.pending_revisions.push(pending.clone());
        pending
    }

    /// Queue position of the addressed entry.
    pub fn pending_position(&self, pending: PendingRef) -> Result<usize, CoreError> {
        let position = match pending {
            PendingRef::Id(id) => self.pending_revisions.iter().position(|p| p.id == id),
            PendingRef::Index(idx) => (idx < self.pending_revisions.len()).then_some(idx),
        };
        position.ok_or_else(|| {
            CoreError::not_found("PendingRevision", format!("{}/{pending}", self.slug))
        })
    }

    pub fn pending(&self, pending: PendingRef) -> Result<&PendingRevision, CoreError> {
        let position = self.pending_position(pending)?;
        Ok(&self.pending_revisions[position])
    }

    /// Remove and return the addressed entry. Order of the rest is preserved.
    pub fn dequeue_pending(&mut self, pending: PendingRef) -> Result<PendingRevision, CoreError> {
        let position = self.pending_position(pending)?;
        Ok(self.pending_revisions.remove(position))
    }

    /// Whether approving `pending` moves the page out of its current section.
    pub fn is_move(&self, pending: &PendingRevision) -> bool {
        pending.section_id != self.section_id
    }

    pub fn summary(&self) -> PageSummary {
        let head = self.current_revision();
        PageSummary {
            slug: self.slug.clone(),
            title: self.title.clone(),
            section_id: self.section_id.clone(),
            updated_at: head.map(|r| r.created_at),
            author_id: head.map(|r| r.author_id.clone()),
            latest_version: head.map(|r| r.version),
            pending_count: self.pending_revisions.len(),
        }
    }

    pub fn into_view(self) -> PageView {
        PageView {
            current_revision: self.current_revision().cloned(),
            status: self.status(),
            page: self,
        }
    }
}
