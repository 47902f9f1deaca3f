//! `pages`, `revisions`, and `pending_revisions` rows.

use chrono::{DateTime, Utc};
use quire_core::page::{Page, PageSummary, PendingRevision, Revision};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `pages` table.
#[derive(Debug, Clone, FromRow)]
pub struct PageRow {
    pub slug: String,
    pub title: String,
    pub section_id: String,
    pub review_required: bool,
    pub row_version: i64,
}

/// A row from the `revisions` table.
#[derive(Debug, Clone, FromRow)]
pub struct RevisionRow {
    pub page_slug: String,
    pub version: i32,
    pub content: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl From<RevisionRow> for Revision {
    fn from(row: RevisionRow) -> Self {
        Revision {
            version: row.version,
            content: row.content,
            author_id: row.author_id,
            created_at: row.created_at,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
        }
    }
}

/// A row from the `pending_revisions` table.
#[derive(Debug, Clone, FromRow)]
pub struct PendingRow {
    pub id: Uuid,
    pub page_slug: String,
    pub content: String,
    pub title: Option<String>,
    pub section_id: String,
    pub author_id: String,
    pub submitted_at: DateTime<Utc>,
}

impl From<PendingRow> for PendingRevision {
    fn from(row: PendingRow) -> Self {
        PendingRevision {
            id: row.id,
            content: row.content,
            title: row.title,
            section_id: row.section_id,
            author_id: row.author_id,
            submitted_at: row.submitted_at,
        }
    }
}

/// Page listing row: the page joined with its head revision, if any.
#[derive(Debug, Clone, FromRow)]
pub struct PageSummaryRow {
    pub slug: String,
    pub title: String,
    pub section_id: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub author_id: Option<String>,
    pub latest_version: Option<i32>,
    pub pending_count: i64,
}

impl From<PageSummaryRow> for PageSummary {
    fn from(row: PageSummaryRow) -> Self {
        PageSummary {
            slug: row.slug,
            title: row.title,
            section_id: row.section_id,
            updated_at: row.updated_at,
            author_id: row.author_id,
            latest_version: row.latest_version,
            pending_count: usize::try_from(row.pending_count).unwrap_or_default(),
        }
    }
}

/// Build the aggregate. `revisions` must be newest first and `pending` in
/// queue order, as the repository queries return them.
pub fn assemble(row: PageRow, revisions: Vec<RevisionRow>, pending: Vec<PendingRow>) -> Page {
    Page {
        slug: row.slug,
        title: row.title,
        section_id: row.section_id,
        review_required: row.review_required,
        revisions: revisions.into_iter().map(Revision::from).collect(),
        pending_revisions: pending.into_iter().map(PendingRevision::from).collect(),
        row_version: row.row_version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revision(version: i32) -> RevisionRow {
        RevisionRow {
            page_slug: "home".into(),
            version,
            content: format!("v{version}"),
            author_id: "u2".into(),
            created_at: Utc::now(),
            approved_by: (version == 2).then(|| "u1".to_string()),
            approved_at: (version == 2).then(Utc::now),
        }
    }

    #[test]
    fn assemble_keeps_order_and_row_version() {
        let row = PageRow {
            slug: "home".into(),
            title: "Home".into(),
            section_id: "general".into(),
            review_required: true,
            row_version: 4,
        };
        let pending = PendingRow {
            id: Uuid::now_v7(),
            page_slug: "home".into(),
            content: "draft".into(),
            title: None,
            section_id: "restricted".into(),
            author_id: "u2".into(),
            submitted_at: Utc::now(),
        };
        let page = assemble(row, vec![revision(2), revision(1)], vec![pending.clone()]);

        assert_eq!(page.row_version, 4);
        assert!(page.review_required);
        assert_eq!(page.head_version(), 2);
        assert_eq!(page.current_revision().unwrap().approved_by.as_deref(), Some("u1"));
        assert_eq!(page.pending_revisions[0].id, pending.id);
        assert!(page.is_move(&page.pending_revisions[0]));
    }

    #[test]
    fn unpublished_summary_has_no_head() {
        let summary: PageSummary = PageSummaryRow {
            slug: "draft".into(),
            title: "Draft".into(),
            section_id: "restricted".into(),
            updated_at: None,
            author_id: None,
            latest_version: None,
            pending_count: 2,
        }
        .into();
        assert_eq!(summary.latest_version, None);
        assert_eq!(summary.pending_count, 2);
    }
}
