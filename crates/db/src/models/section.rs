//! `sections` rows.

use quire_core::section::Section;
use sqlx::FromRow;

/// A row from the `sections` table.
#[derive(Debug, Clone, FromRow)]
pub struct SectionRow {
    pub id: String,
    pub title: String,
    pub read_groups: Vec<String>,
    pub write_groups: Vec<String>,
    pub approver_groups: Vec<String>,
    pub review_required: bool,
}

impl From<SectionRow> for Section {
    fn from(row: SectionRow) -> Self {
        Section {
            id: row.id,
            title: row.title,
            read_groups: row.read_groups.into_iter().collect(),
            write_groups: row.write_groups.into_iter().collect(),
            approver_groups: row.approver_groups.into_iter().collect(),
            review_required: row.review_required,
        }
    }
}
