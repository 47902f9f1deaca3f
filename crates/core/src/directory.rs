//! Users, groups, and the identity-to-groups resolver.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::store::DirectoryStore;
use crate::types::{GroupId, GroupSet, UserId};

/// Global permission labels a group may carry. Section-scoped rules live on
/// [`crate::section::Section`]; these labels are informational for clients.
pub const KNOWN_PERMISSIONS: &[&str] = &["read", "write", "delete", "manage"];

/// A wiki identity and its group memberships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub groups: GroupSet,
    /// Argon2id PHC string. Never serialized.
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
}

/// A named permission bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

/// Full replacement of a user's mutable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInput {
    pub name: String,
    #[serde(default)]
    pub groups: GroupSet,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupInput {
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

/// Reject permission labels outside [`KNOWN_PERMISSIONS`].
pub fn validate_permissions(permissions: &BTreeSet<String>) -> Result<(), CoreError> {
    if let Some(unknown) = permissions
        .iter()
        .find(|p| !KNOWN_PERMISSIONS.contains(&p.as_str()))
    {
        return Err(CoreError::Validation(format!(
            "Unknown permission '{unknown}'. Valid permissions: {}",
            KNOWN_PERMISSIONS.join(", ")
        )));
    }
    Ok(())
}

/// Resolve an identity to its current groups.
///
/// Always reads through to the store: memberships may change between two
/// calls in the same session, so results must not be cached.
pub async fn resolve_groups<S: DirectoryStore + ?Sized>(
    store: &S,
    user_id: &str,
) -> Result<GroupSet, CoreError> {
    store
        .find_user(user_id)
        .await?
        .map(|user| user.groups)
        .ok_or_else(|| CoreError::not_found("User", user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: "u1".into(),
            name: "Alice".into(),
            groups: GroupSet::from(["admin".to_string()]),
            password_hash: Some("$argon2id$secret".into()),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["groups"], serde_json::json!(["admin"]));
    }

    #[test]
    fn unknown_permission_rejected() {
        let perms = BTreeSet::from(["read".to_string(), "fly".to_string()]);
        let err = validate_permissions(&perms).unwrap_err();
        assert!(err.to_string().contains("fly"));
    }

    #[test]
    fn known_permissions_accepted() {
        let perms = BTreeSet::from(["read".to_string(), "manage".to_string()]);
        assert!(validate_permissions(&perms).is_ok());
    }
}
