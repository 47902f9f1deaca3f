//! Admin-only management of users, groups, and sections.
//!
//! Every write here requires the caller to hold the `admin` group, resolved
//! fresh on each call. Section reads are available to anyone who can read the
//! section.

use serde::Serialize;

use crate::directory::{validate_permissions, Group, GroupInput, User, UserInput};
use crate::error::CoreError;
use crate::permissions::{can_read, ensure_admin, ensure_read, is_admin};
use crate::roles::GROUP_ADMIN;
use crate::section::{audit, Section, SectionInput, SectionWarning};
use crate::types::GroupSet;
use crate::validation::{validate_id, validate_title};
use crate::workflow::WikiService;

/// Result of a section create/update: the stored section and any
/// configuration it would be wise to double-check.
#[derive(Debug, Clone, Serialize)]
pub struct SectionWrite {
    pub section: Section,
    pub warnings: Vec<SectionWarning>,
}

impl WikiService {
    async fn require_admin(&self, caller: &str) -> Result<(), CoreError> {
        ensure_admin(&self.groups_of(caller).await?)
    }

    /// Every referenced group must exist.
    async fn check_groups_exist(&self, groups: &GroupSet) -> Result<(), CoreError> {
        for id in groups {
            if self.store().find_group(id).await?.is_none() {
                return Err(CoreError::Validation(format!("Unknown group '{id}'")));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn list_users(&self, caller: &str) -> Result<Vec<User>, CoreError> {
        self.require_admin(caller).await?;
        self.store().list_users().await
    }

    pub async fn get_user(&self, caller: &str, id: &str) -> Result<User, CoreError> {
        self.require_admin(caller).await?;
        self.store()
            .find_user(id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", id))
    }

    /// `password_hash` is an already-hashed PHC string; hashing is the
    /// caller's concern.
    pub async fn create_user(
        &self,
        caller: &str,
        id: &str,
        input: UserInput,
        password_hash: Option<String>,
    ) -> Result<User, CoreError> {
        self.require_admin(caller).await?;
        validate_id("user", id)?;
        validate_title(&input.name)?;
        self.check_groups_exist(&input.groups).await?;

        let user = User {
            id: id.to_string(),
            name: input.name,
            groups: input.groups,
            password_hash,
        };
        self.store().insert_user(&user).await?;
        Ok(user)
    }

    /// Replace name and groups. The password hash is kept unless a new one is given.
    pub async fn update_user(
        &self,
        caller: &str,
        id: &str,
        input: UserInput,
        password_hash: Option<String>,
    ) -> Result<User, CoreError> {
        self.require_admin(caller).await?;
        validate_title(&input.name)?;
        self.check_groups_exist(&input.groups).await?;

        let mut user = self
            .store()
            .find_user(id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", id))?;
        if id == caller && !is_admin(&input.groups) {
            return Err(CoreError::Conflict(
                "Cannot remove your own admin membership".into(),
            ));
        }
        user.name = input.name;
        user.groups = input.groups;
        if password_hash.is_some() {
            user.password_hash = password_hash;
        }
        self.store().update_user(&user).await?;
        Ok(user)
    }

    pub async fn delete_user(&self, caller: &str, id: &str) -> Result<(), CoreError> {
        self.require_admin(caller).await?;
        if id == caller {
            return Err(CoreError::Conflict("Cannot delete your own account".into()));
        }
        if !self.store().delete_user(id).await? {
            return Err(CoreError::not_found("User", id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    pub async fn list_groups(&self, caller: &str) -> Result<Vec<Group>, CoreError> {
        self.require_admin(caller).await?;
        self.store().list_groups().await
    }

    pub async fn create_group(
        &self,
        caller: &str,
        id: &str,
        input: GroupInput,
    ) -> Result<Group, CoreError> {
        self.require_admin(caller).await?;
        validate_id("group", id)?;
        validate_permissions(&input.permissions)?;

        let group = Group {
            id: id.to_string(),
            permissions: input.permissions,
        };
        self.store().insert_group(&group).await?;
        Ok(group)
    }

    pub async fn update_group(
        &self,
        caller: &str,
        id: &str,
        input: GroupInput,
    ) -> Result<Group, CoreError> {
        self.require_admin(caller).await?;
        validate_permissions(&input.permissions)?;

        let group = Group {
            id: id.to_string(),
            permissions: input.permissions,
        };
        self.store().update_group(&group).await?;
        Ok(group)
    }

    /// Refused for the `admin` group and for any group that still has members.
    pub async fn delete_group(&self, caller: &str, id: &str) -> Result<(), CoreError> {
        self.require_admin(caller).await?;
        if id == GROUP_ADMIN {
            return Err(CoreError::Conflict(format!(
                "The '{GROUP_ADMIN}' group cannot be deleted"
            )));
        }
        let members = self
            .store()
            .list_users()
            .await?
            .into_iter()
            .filter(|u| u.groups.contains(id))
            .count();
        if members > 0 {
            return Err(CoreError::Conflict(format!(
                "Group '{id}' still has {members} member(s)"
            )));
        }
        if !self.store().delete_group(id).await? {
            return Err(CoreError::not_found("Group", id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Sections
    // ------------------------------------------------------------------

    /// Sections the caller can read. Admins see every section.
    pub async fn list_sections(&self, caller: &str) -> Result<Vec<Section>, CoreError> {
        let groups = self.groups_of(caller).await?;
        let sections = self.store().list_sections().await?;
        if is_admin(&groups) {
            return Ok(sections);
        }
        Ok(sections
            .into_iter()
            .filter(|s| can_read(s, &groups))
            .collect())
    }

    pub async fn get_section(&self, caller: &str, id: &str) -> Result<Section, CoreError> {
        let groups = self.groups_of(caller).await?;
        let section = self
            .store()
            .find_section(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Section", id))?;
        if !is_admin(&groups) {
            ensure_read(&section, &groups)?;
        }
        Ok(section)
    }

    pub async fn create_section(
        &self,
        caller: &str,
        id: &str,
        input: SectionInput,
    ) -> Result<SectionWrite, CoreError> {
        self.require_admin(caller).await?;
        validate_id("section", id)?;
        validate_title(&input.title)?;

        let section = Section::new(id, input);
        self.store().insert_section(&section).await?;
        Ok(SectionWrite {
            warnings: audit(&section),
            section,
        })
    }

    /// Full replacement of the permission set; the id is immutable.
    pub async fn update_section(
        &self,
        caller: &str,
        id: &str,
        input: SectionInput,
    ) -> Result<SectionWrite, CoreError> {
        self.require_admin(caller).await?;
        validate_title(&input.title)?;

        let mut section = self
            .store()
            .find_section(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Section", id))?;
        section.replace(input);
        self.store().update_section(&section).await?;
        Ok(SectionWrite {
            warnings: audit(&section),
            section,
        })
    }

    /// Blocked while any page lives in the section or any pending revision
    /// would publish into it.
    pub async fn delete_section(&self, caller: &str, id: &str) -> Result<(), CoreError> {
        self.require_admin(caller).await?;
        let _sections = self.sections_exclusive().await;
        let pages = self.store().count_pages_in_section(id).await?;
        if pages > 0 {
            return Err(CoreError::Conflict(format!(
                "Section '{id}' still contains {pages} page(s)"
            )));
        }
        let pending = self.store().count_pending_in_section(id).await?;
        if pending > 0 {
            return Err(CoreError::Conflict(format!(
                "Section '{id}' is the target of {pending} pending revision(s)"
            )));
        }
        if !self.store().delete_section(id).await? {
            return Err(CoreError::not_found("Section", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::error::ForbiddenReason;
    use crate::page::PendingRef;
    use crate::snapshot;
    use crate::store::memory::MemoryStore;
    use crate::workflow::SaveRequest;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Seeded wiki: u1 admin, u2 editor, u3 viewer.
    async fn service() -> WikiService {
        let store = Arc::new(MemoryStore::new());
        snapshot::import(&*store, snapshot::seed()).await.unwrap();
        WikiService::new(store, "general")
    }

    fn section_input(review: bool, approvers: &[&str]) -> SectionInput {
        SectionInput {
            title: "Engineering".into(),
            read_groups: set(&["editor"]),
            write_groups: set(&["editor"]),
            approver_groups: set(approvers),
            review_required: review,
        }
    }

    #[tokio::test]
    async fn non_admin_is_refused() {
        let svc = service().await;
        assert_matches!(
            svc.list_users("u2").await,
            Err(CoreError::Forbidden(ForbiddenReason::NotAdmin))
        );
        assert_matches!(
            svc.create_section("u2", "eng", section_input(false, &[])).await,
            Err(CoreError::Forbidden(ForbiddenReason::NotAdmin))
        );
    }

    #[tokio::test]
    async fn membership_change_takes_effect_immediately() {
        let svc = service().await;
        assert!(svc.list_users("u2").await.is_err());
        svc.update_user(
            "u1",
            "u2",
            UserInput {
                name: "Bob".into(),
                groups: set(&["editor", "admin"]),
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(svc.list_users("u2").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn user_with_unknown_group_is_rejected() {
        let svc = service().await;
        let err = svc
            .create_user(
                "u1",
                "u9",
                UserInput {
                    name: "Dana".into(),
                    groups: set(&["wizards"]),
                },
                None,
            )
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("wizards"));
    }

    #[tokio::test]
    async fn update_keeps_password_hash_unless_replaced() {
        let svc = service().await;
        svc.create_user(
            "u1",
            "u9",
            UserInput {
                name: "Dana".into(),
                groups: set(&["viewer"]),
            },
            Some("hash-1".into()),
        )
        .await
        .unwrap();
        let input = || UserInput {
            name: "Dana R.".into(),
            groups: set(&["editor"]),
        };
        let kept = svc.update_user("u1", "u9", input(), None).await.unwrap();
        assert_eq!(kept.password_hash.as_deref(), Some("hash-1"));
        let replaced = svc
            .update_user("u1", "u9", input(), Some("hash-2".into()))
            .await
            .unwrap();
        assert_eq!(replaced.password_hash.as_deref(), Some("hash-2"));
    }

    #[tokio::test]
    async fn admin_cannot_delete_or_demote_self() {
        let svc = service().await;
        assert_matches!(svc.delete_user("u1", "u1").await, Err(CoreError::Conflict(_)));
        assert_matches!(
            svc.update_user(
                "u1",
                "u1",
                UserInput {
                    name: "Alice".into(),
                    groups: set(&["editor"]),
                },
                None,
            )
            .await,
            Err(CoreError::Conflict(_))
        );
        svc.delete_user("u1", "u3").await.unwrap();
        assert_matches!(
            svc.delete_user("u1", "u3").await,
            Err(CoreError::NotFound { entity: "User", .. })
        );
    }

    #[tokio::test]
    async fn group_permissions_are_validated() {
        let svc = service().await;
        let bad = GroupInput {
            permissions: set(&["fly"]),
        };
        assert_matches!(
            svc.create_group("u1", "pilots", bad).await,
            Err(CoreError::Validation(_))
        );
        let good = GroupInput {
            permissions: set(&["read"]),
        };
        svc.create_group("u1", "pilots", good.clone()).await.unwrap();
        assert_matches!(
            svc.create_group("u1", "pilots", good).await,
            Err(CoreError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn group_with_members_or_admin_group_cannot_be_deleted() {
        let svc = service().await;
        assert_matches!(svc.delete_group("u1", "admin").await, Err(CoreError::Conflict(_)));
        assert_matches!(svc.delete_group("u1", "viewer").await, Err(CoreError::Conflict(_)));
        svc.create_group("u1", "empty", GroupInput::default())
            .await
            .unwrap();
        svc.delete_group("u1", "empty").await.unwrap();
        assert_eq!(svc.list_groups("u1").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn section_write_reports_warnings_without_correcting() {
        let svc = service().await;
        let created = svc
            .create_section("u1", "eng", section_input(true, &[]))
            .await
            .unwrap();
        assert_eq!(created.warnings, vec![SectionWarning::ReviewWithoutApprovers]);
        assert!(created.section.approver_groups.is_empty());

        let updated = svc
            .update_section("u1", "eng", section_input(true, &["admin"]))
            .await
            .unwrap();
        assert!(updated.warnings.is_empty());
        assert_eq!(updated.section.id, "eng");
    }

    #[tokio::test]
    async fn update_replaces_permission_sets() {
        let svc = service().await;
        let mut input = section_input(false, &["admin"]);
        input.read_groups = set(&["viewer"]);
        let out = svc.update_section("u1", "general", input).await.unwrap();
        assert_eq!(out.section.read_groups, set(&["viewer"]));
        assert_eq!(out.section.write_groups, set(&["editor"]));
        assert_matches!(
            svc.update_section("u1", "nope", section_input(false, &[])).await,
            Err(CoreError::NotFound { entity: "Section", .. })
        );
    }

    #[tokio::test]
    async fn section_with_pages_cannot_be_deleted() {
        let svc = service().await;
        assert_matches!(
            svc.delete_section("u1", "general").await,
            Err(CoreError::Conflict(_))
        );
        svc.create_section("u1", "eng", section_input(false, &[]))
            .await
            .unwrap();
        svc.delete_section("u1", "eng").await.unwrap();
        assert_matches!(
            svc.delete_section("u1", "eng").await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn moving_last_page_out_unblocks_deletion() {
        let svc = service().await;
        svc.create_section("u1", "eng", section_input(false, &[]))
            .await
            .unwrap();
        svc.save(
            "u2",
            SaveRequest {
                slug: "runbook".into(),
                title: "Runbook".into(),
                content: "steps".into(),
                section_id: Some("eng".into()),
            },
        )
        .await
        .unwrap();
        assert!(svc.delete_section("u1", "eng").await.is_err());

        svc.save(
            "u2",
            SaveRequest {
                slug: "runbook".into(),
                title: "Runbook".into(),
                content: "steps".into(),
                section_id: Some("general".into()),
            },
        )
        .await
        .unwrap();
        svc.delete_section("u1", "eng").await.unwrap();
    }

    #[tokio::test]
    async fn pending_move_into_section_blocks_deletion() {
        let svc = service().await;
        svc.create_section("u1", "archive", section_input(true, &["admin"]))
            .await
            .unwrap();
        let out = svc
            .save(
                "u2",
                SaveRequest {
                    slug: "home".into(),
                    title: "Home".into(),
                    content: "archived".into(),
                    section_id: Some("archive".into()),
                },
            )
            .await
            .unwrap();
        let pending = out.pending.unwrap();
        assert_eq!(out.page.section_id, "general");

        assert_matches!(
            svc.delete_section("u1", "archive").await,
            Err(CoreError::Conflict(msg)) if msg.contains("pending")
        );
        // The entry stays decidable.
        svc.reject("home", PendingRef::Id(pending.id), "u1")
            .await
            .unwrap();
        svc.delete_section("u1", "archive").await.unwrap();
    }

    #[tokio::test]
    async fn deletion_waits_for_in_flight_writers() {
        let svc = Arc::new(service().await);
        svc.create_section("u1", "eng", section_input(false, &[]))
            .await
            .unwrap();

        let writer = svc.sections_shared().await;
        let deletion = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.delete_section("u1", "eng").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!deletion.is_finished());

        drop(writer);
        tokio::time::timeout(Duration::from_secs(1), deletion)
            .await
            .expect("deletion should proceed once writers finish")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn section_listing_is_read_filtered() {
        let svc = service().await;
        let ids = |v: Vec<Section>| v.into_iter().map(|s| s.id).collect::<Vec<_>>();
        assert_eq!(ids(svc.list_sections("u3").await.unwrap()), vec!["general"]);
        assert_eq!(
            ids(svc.list_sections("u1").await.unwrap()),
            vec!["general", "restricted"]
        );
        assert_matches!(
            svc.get_section("u3", "restricted").await,
            Err(CoreError::Forbidden(ForbiddenReason::NotReader))
        );
    }
}
