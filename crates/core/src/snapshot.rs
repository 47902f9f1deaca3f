//! Whole-wiki documents: loading, legacy-shape migration, and import.
//!
//! A snapshot is one JSON document holding `users`, `groups`, `sections`, and
//! `pages`. Several historical layouts are accepted and normalized into the
//! canonical model here, so nothing past this module ever branches on field
//! presence:
//!
//! | Field      | Accepted shapes |
//! |------------|-----------------|
//! | `groups`   | `{id: {permissions}}`, `{id: [perm]}`, `[id]`, `[{id, permissions}]` |
//! | `sections` | list or id-keyed map; `read_groups`/`write_groups`/`approver_groups` or legacy `permissions.{view,edit,publish}`; `requireReview` |
//! | `pages`    | list or slug-keyed map; camelCase fields; `id` as slug fallback |
//! | `versions` | detached revision rows keyed by `pageId`, with a `status` |
//!
//! Timestamps may be RFC 3339 strings or millisecond epochs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::{Group, User};
use crate::error::CoreError;
use crate::page::{Page, PendingRevision, Revision};
use crate::roles::{GROUP_ADMIN, GROUP_EDITOR, GROUP_VIEWER};
use crate::section::{audit, Section, SectionWarning};
use crate::store::WikiStore;
use crate::types::{GroupId, SectionId, Timestamp, Version};
use crate::validation::validate_slug;

/// Canonical, validated wiki document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WikiSnapshot {
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub sections: Vec<Section>,
    pub pages: Vec<Page>,
}

/// What an [`import`] actually wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub users: usize,
    pub groups: usize,
    pub sections: usize,
    pub pages: usize,
    /// Configuration warnings for every imported section.
    pub warnings: Vec<(SectionId, SectionWarning)>,
}

impl WikiSnapshot {
    /// Parse and migrate a document. Pages naming no section land in `default_section`.
    pub fn from_json(text: &str, default_section: &str) -> Result<Self, CoreError> {
        let raw: RawSnapshot = serde_json::from_str(text)
            .map_err(|e| CoreError::Validation(format!("Malformed snapshot: {e}")))?;
        raw.migrate(default_section)
    }

    pub async fn from_path(path: impl AsRef<Path>, default_section: &str) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            CoreError::Storage(format!("Failed to read snapshot {}: {e}", path.display()))
        })?;
        Self::from_json(&text, default_section)
    }
}

/// Write every entity of `snapshot` that the store does not hold yet.
///
/// Existing users, groups, sections, and pages are left untouched, so
/// importing the same document twice is a no-op. Every page's section, and
/// the section of each of its pending revisions, must exist once the
/// snapshot's own sections are in.
pub async fn import<S: WikiStore + ?Sized>(
    store: &S,
    snapshot: WikiSnapshot,
) -> Result<ImportReport, CoreError> {
    let mut report = ImportReport::default();

    for group in &snapshot.groups {
        if store.find_group(&group.id).await?.is_none() {
            store.insert_group(group).await?;
            report.groups += 1;
        }
    }
    for user in &snapshot.users {
        if store.find_user(&user.id).await?.is_none() {
            store.insert_user(user).await?;
            report.users += 1;
        }
    }
    for section in &snapshot.sections {
        report
            .warnings
            .extend(audit(section).into_iter().map(|w| (section.id.clone(), w)));
        if store.find_section(&section.id).await?.is_none() {
            store.insert_section(section).await?;
            report.sections += 1;
        }
    }
    for page in &snapshot.pages {
        if store.load_page(&page.slug).await?.is_some() {
            continue;
        }
        let targets = std::iter::once(&page.section_id)
            .chain(page.pending_revisions.iter().map(|p| &p.section_id));
        for section_id in targets {
            if store.find_section(section_id).await?.is_none() {
                return Err(CoreError::InvalidSection(section_id.clone()));
            }
        }
        let mut fresh = page.clone();
        fresh.row_version = 0;
        store.commit_page(&fresh).await?;
        report.pages += 1;
    }
    Ok(report)
}

fn groups(names: &[&str]) -> BTreeSet<GroupId> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Built-in starter wiki used when no snapshot file is configured.
pub fn seed() -> WikiSnapshot {
    let now = Utc::now();
    let user = |id: &str, name: &str, group: &str| User {
        id: id.into(),
        name: name.into(),
        groups: groups(&[group]),
        password_hash: None,
    };
    let group = |id: &str, perms: &[&str]| Group {
        id: id.into(),
        permissions: groups(perms),
    };

    let mut home = Page::new("home", "Home", "general".into());
    home.append_revision(
        "# Welcome\n\nEvery published change to this page is kept as a numbered revision.\n\n\
         Try editing it!"
            .into(),
        "u1".into(),
        None,
        now,
    );

    WikiSnapshot {
        users: vec![
            user("u1", "Alice", GROUP_ADMIN),
            user("u2", "Bob", GROUP_EDITOR),
            user("u3", "Charlie", GROUP_VIEWER),
        ],
        groups: vec![
            group(GROUP_ADMIN, &["read", "write", "delete", "manage"]),
            group(GROUP_EDITOR, &["read", "write"]),
            group(GROUP_VIEWER, &["read"]),
        ],
        sections: vec![
            Section {
                id: "general".into(),
                title: "General".into(),
                read_groups: groups(&[GROUP_VIEWER, GROUP_EDITOR, GROUP_ADMIN]),
                write_groups: groups(&[GROUP_EDITOR, GROUP_ADMIN]),
                approver_groups: groups(&[GROUP_ADMIN]),
                review_required: false,
            },
            Section {
                id: "restricted".into(),
                title: "Restricted".into(),
                read_groups: groups(&[GROUP_EDITOR, GROUP_ADMIN]),
                write_groups: groups(&[GROUP_EDITOR, GROUP_ADMIN]),
                approver_groups: groups(&[GROUP_ADMIN]),
                review_required: true,
            },
        ],
        pages: vec![home],
    }
}

// ----------------------------------------------------------------------
// Raw document shapes
// ----------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawSnapshot {
    users: Vec<RawUser>,
    groups: RawGroups,
    sections: Keyed<RawSection>,
    pages: Keyed<RawPage>,
    #[serde(alias = "versions")]
    revisions: Vec<RawDetachedRevision>,
}

/// A list, or a map whose keys stand in for missing ids.
#[derive(Deserialize)]
#[serde(untagged)]
enum Keyed<T> {
    List(Vec<T>),
    Map(BTreeMap<String, T>),
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Keyed::List(Vec::new())
    }
}

trait HasKey {
    fn fill_key(&mut self, key: String);
}

impl<T: HasKey> Keyed<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Keyed::List(items) => items,
            Keyed::Map(map) => map
                .into_iter()
                .map(|(key, mut item)| {
                    item.fill_key(key);
                    item
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    fn resolve(self) -> Result<Timestamp, CoreError> {
        match self {
            RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .ok_or_else(|| CoreError::Validation(format!("Timestamp {ms} out of range"))),
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| CoreError::Validation(format!("Bad timestamp '{s}': {e}"))),
        }
    }
}

fn resolve_or_now(ts: Option<RawTimestamp>, now: Timestamp) -> Result<Timestamp, CoreError> {
    ts.map_or(Ok(now), RawTimestamp::resolve)
}

#[derive(Deserialize)]
struct RawUser {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    groups: BTreeSet<GroupId>,
    #[serde(default, alias = "passwordHash")]
    password_hash: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroups {
    Map(BTreeMap<String, RawGroupBody>),
    List(Vec<RawGroupEntry>),
}

impl Default for RawGroups {
    fn default() -> Self {
        RawGroups::List(Vec::new())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroupBody {
    Permissions(BTreeSet<String>),
    Object {
        #[serde(default)]
        permissions: BTreeSet<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroupEntry {
    Name(String),
    Object {
        id: String,
        #[serde(default)]
        permissions: BTreeSet<String>,
    },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct LegacyPermissions {
    view: BTreeSet<GroupId>,
    edit: BTreeSet<GroupId>,
    publish: BTreeSet<GroupId>,
}

#[derive(Deserialize)]
struct RawSection {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "name")]
    title: Option<String>,
    #[serde(default, alias = "readGroups")]
    read_groups: Option<BTreeSet<GroupId>>,
    #[serde(default, alias = "writeGroups")]
    write_groups: Option<BTreeSet<GroupId>>,
    #[serde(default, alias = "approverGroups")]
    approver_groups: Option<BTreeSet<GroupId>>,
    #[serde(default, alias = "reviewRequired", alias = "requireReview")]
    review_required: bool,
    #[serde(default)]
    permissions: Option<LegacyPermissions>,
}

impl HasKey for RawSection {
    fn fill_key(&mut self, key: String) {
        self.id.get_or_insert(key);
    }
}

#[derive(Deserialize)]
struct RawRevision {
    #[serde(alias = "versionNumber")]
    version: Version,
    content: String,
    #[serde(alias = "authorId", alias = "author")]
    author_id: String,
    #[serde(default, alias = "createdAt", alias = "timestamp")]
    created_at: Option<RawTimestamp>,
    #[serde(default, alias = "approvedBy")]
    approved_by: Option<String>,
    #[serde(default, alias = "approvedAt")]
    approved_at: Option<RawTimestamp>,
}

#[derive(Deserialize)]
struct RawPending {
    #[serde(default)]
    id: Option<String>,
    content: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "sectionId")]
    section_id: Option<String>,
    #[serde(alias = "authorId", alias = "author")]
    author_id: String,
    #[serde(default, alias = "submittedAt", alias = "timestamp")]
    submitted_at: Option<RawTimestamp>,
}

#[derive(Deserialize)]
struct RawPage {
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default, alias = "sectionId")]
    section_id: Option<String>,
    #[serde(default, alias = "reviewRequired", alias = "requireReview")]
    review_required: bool,
    #[serde(default)]
    revisions: Vec<RawRevision>,
    #[serde(default, alias = "pendingRevisions")]
    pending_revisions: Vec<RawPending>,
}

impl HasKey for RawPage {
    fn fill_key(&mut self, key: String) {
        if self.slug.is_none() && self.id.is_none() {
            self.slug = Some(key);
        }
    }
}

/// A revision stored beside, not inside, its page.
#[derive(Deserialize)]
struct RawDetachedRevision {
    #[serde(alias = "pageId")]
    page_id: String,
    #[serde(alias = "versionNumber")]
    version: Version,
    content: String,
    #[serde(alias = "authorId", alias = "author")]
    author_id: String,
    #[serde(default, alias = "timestamp", alias = "createdAt")]
    created_at: Option<RawTimestamp>,
    #[serde(default)]
    status: Option<String>,
}

// ----------------------------------------------------------------------
// Migration
// ----------------------------------------------------------------------

impl RawSnapshot {
    fn migrate(self, default_section: &str) -> Result<WikiSnapshot, CoreError> {
        let now = Utc::now();

        let users = self
            .users
            .into_iter()
            .map(|u| User {
                name: u.name.unwrap_or_else(|| u.id.clone()),
                id: u.id,
                groups: u.groups,
                password_hash: u.password_hash,
            })
            .collect();

        let groups = match self.groups {
            RawGroups::Map(map) => map
                .into_iter()
                .map(|(id, body)| Group {
                    id,
                    permissions: match body {
                        RawGroupBody::Permissions(p) | RawGroupBody::Object { permissions: p } => p,
                    },
                })
                .collect(),
            RawGroups::List(entries) => entries
                .into_iter()
                .map(|entry| match entry {
                    RawGroupEntry::Name(id) => Group {
                        id,
                        permissions: BTreeSet::new(),
                    },
                    RawGroupEntry::Object { id, permissions } => Group { id, permissions },
                })
                .collect(),
        };

        let sections = self
            .sections
            .into_vec()
            .into_iter()
            .map(migrate_section)
            .collect::<Result<Vec<_>, _>>()?;

        let mut pages = self
            .pages
            .into_vec()
            .into_iter()
            .map(|p| migrate_page(p, default_section, now))
            .collect::<Result<Vec<_>, _>>()?;

        attach_detached(&mut pages, self.revisions, now)?;
        for page in &mut pages {
            finish_chain(page)?;
        }

        Ok(WikiSnapshot {
            users,
            groups,
            sections,
            pages,
        })
    }
}

fn migrate_section(raw: RawSection) -> Result<Section, CoreError> {
    let id = raw
        .id
        .ok_or_else(|| CoreError::Validation("Section without id".into()))?;
    let legacy = raw.permissions.unwrap_or_default();
    Ok(Section {
        title: raw.title.unwrap_or_else(|| id.clone()),
        read_groups: raw.read_groups.unwrap_or(legacy.view),
        write_groups: raw.write_groups.unwrap_or(legacy.edit),
        approver_groups: raw.approver_groups.unwrap_or(legacy.publish),
        review_required: raw.review_required,
        id,
    })
}

fn migrate_page(raw: RawPage, default_section: &str, now: Timestamp) -> Result<Page, CoreError> {
    let slug = raw
        .slug
        .or(raw.id)
        .ok_or_else(|| CoreError::Validation(format!("Page '{}' has no slug", raw.title)))?;
    validate_slug(&slug).map_err(|e| match e {
        CoreError::Validation(msg) => CoreError::Validation(format!("Page '{slug}': {msg}")),
        other => other,
    })?;
    let section_id = raw
        .section_id
        .unwrap_or_else(|| default_section.to_string());

    let mut page = Page::new(slug, raw.title, section_id);
    page.review_required = raw.review_required;

    for rev in raw.revisions {
        page.revisions.push(Revision {
            version: rev.version,
            content: rev.content,
            author_id: rev.author_id,
            created_at: resolve_or_now(rev.created_at, now)?,
            approved_by: rev.approved_by,
            approved_at: rev.approved_at.map(RawTimestamp::resolve).transpose()?,
        });
    }
    for pending in raw.pending_revisions {
        let id = pending
            .id
            .and_then(|s| Uuid::parse_str(&s).ok())
            .unwrap_or_else(Uuid::now_v7);
        let entry = PendingRevision {
            id,
            content: pending.content,
            title: pending.title.filter(|t| *t != page.title),
            section_id: pending
                .section_id
                .unwrap_or_else(|| page.section_id.clone()),
            author_id: pending.author_id,
            submitted_at: resolve_or_now(pending.submitted_at, now)?,
        };
        page.pending_revisions.push(entry);
    }
    Ok(page)
}

/// Move `versions` rows into their pages: published rows join the chain,
/// anything else becomes a pending proposal.
fn attach_detached(
    pages: &mut [Page],
    rows: Vec<RawDetachedRevision>,
    now: Timestamp,
) -> Result<(), CoreError> {
    for row in rows {
        let page = pages
            .iter_mut()
            .find(|p| p.slug == row.page_id)
            .ok_or_else(|| {
                CoreError::Validation(format!("Revision for unknown page '{}'", row.page_id))
            })?;
        let created_at = resolve_or_now(row.created_at, now)?;
        match row.status.as_deref() {
            None | Some("published") => page.revisions.push(Revision {
                version: row.version,
                content: row.content,
                author_id: row.author_id,
                created_at,
                approved_by: None,
                approved_at: None,
            }),
            Some(_) => page.pending_revisions.push(PendingRevision {
                id: Uuid::now_v7(),
                content: row.content,
                title: None,
                section_id: page.section_id.clone(),
                author_id: row.author_id,
                submitted_at: created_at,
            }),
        }
    }
    Ok(())
}

/// Order the chain newest first and require versions `1..=n`.
fn finish_chain(page: &mut Page) -> Result<(), CoreError> {
    page.revisions.sort_by(|a, b| b.version.cmp(&a.version));
    for (expected, rev) in (1..).zip(page.revisions.iter().rev()) {
        if rev.version != expected {
            return Err(CoreError::Validation(format!(
                "Page '{}' revision chain is not contiguous: expected version {expected}, found {}",
                page.slug, rev.version
            )));
        }
    }
    page.pending_revisions.sort_by_key(|p| p.submitted_at);
    Ok(())
}
