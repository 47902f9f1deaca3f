//! Section access-control metadata.
//!
//! A section groups pages under shared read/write/approver rules. Updates
//! replace the whole permission set; the id never changes after creation.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{GroupId, SectionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    #[serde(default)]
    pub read_groups: BTreeSet<GroupId>,
    #[serde(default)]
    pub write_groups: BTreeSet<GroupId>,
    #[serde(default)]
    pub approver_groups: BTreeSet<GroupId>,
    #[serde(default)]
    pub review_required: bool,
}

/// Complete, replacing definition of a section's mutable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionInput {
    pub title: String,
    #[serde(default)]
    pub read_groups: BTreeSet<GroupId>,
    #[serde(default)]
    pub write_groups: BTreeSet<GroupId>,
    #[serde(default)]
    pub approver_groups: BTreeSet<GroupId>,
    #[serde(default)]
    pub review_required: bool,
}

impl Section {
    pub fn new(id: impl Into<SectionId>, input: SectionInput) -> Self {
        Self {
            id: id.into(),
            title: input.title,
            read_groups: input.read_groups,
            write_groups: input.write_groups,
            approver_groups: input.approver_groups,
            review_required: input.review_required,
        }
    }

    /// Replace every mutable field. No merge with previous values.
    pub fn replace(&mut self, input: SectionInput) {
        *self = Section::new(std::mem::take(&mut self.id), input);
    }
}

/// A configuration that is valid but most likely unintended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionWarning {
    /// Review is required but nobody can approve, so pending revisions pile up forever.
    ReviewWithoutApprovers,
    /// Nobody can read the section's pages.
    NoReaders,
    /// Nobody can write to the section.
    NoWriters,
}

impl fmt::Display for SectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SectionWarning::ReviewWithoutApprovers => {
                "review is required but approver_groups is empty; no revision can be approved"
            }
            SectionWarning::NoReaders => "read_groups is empty; no one can view these pages",
            SectionWarning::NoWriters => "write_groups is empty; no one can edit these pages",
        })
    }
}

/// Flag likely-unintended configurations. Never corrects them.
pub fn audit(section: &Section) -> Vec<SectionWarning> {
    let mut warnings = Vec::new();
    if section.review_required && section.approver_groups.is_empty() {
        warnings.push(SectionWarning::ReviewWithoutApprovers);
    }
    if section.read_groups.is_empty() {
        warnings.push(SectionWarning::NoReaders);
    }
    if section.write_groups.is_empty() {
        warnings.push(SectionWarning::NoWriters);
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> BTreeSet<GroupId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn input(review: bool, approvers: &[&str]) -> SectionInput {
        SectionInput {
            title: "Engineering".into(),
            read_groups: groups(&["editor"]),
            write_groups: groups(&["editor"]),
            approver_groups: groups(approvers),
            review_required: review,
        }
    }

    #[test]
    fn replace_keeps_id_and_drops_old_groups() {
        let mut section = Section::new("eng", input(true, &["admin", "lead"]));
        section.replace(SectionInput {
            title: "Eng".into(),
            read_groups: groups(&["viewer"]),
            write_groups: BTreeSet::new(),
            approver_groups: groups(&["admin"]),
            review_required: false,
        });
        assert_eq!(section.id, "eng");
        assert_eq!(section.title, "Eng");
        assert_eq!(section.read_groups, groups(&["viewer"]));
        assert!(section.write_groups.is_empty());
        assert_eq!(section.approver_groups, groups(&["admin"]));
        assert!(!section.review_required);
    }

    #[test]
    fn review_without_approvers_is_flagged() {
        let section = Section::new("eng", input(true, &[]));
        assert_eq!(audit(&section), vec![SectionWarning::ReviewWithoutApprovers]);
    }

    #[test]
    fn empty_approvers_without_review_is_fine() {
        let section = Section::new("eng", input(false, &[]));
        assert!(audit(&section).is_empty());
    }
}
