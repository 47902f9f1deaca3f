//! `users` and `groups` rows.

use quire_core::directory::{Group, User};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub groups: Vec<String>,
    pub password_hash: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            groups: row.groups.into_iter().collect(),
            password_hash: row.password_hash,
        }
    }
}

/// A row from the `groups` table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    pub id: String,
    pub permissions: Vec<String>,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Group {
            id: row.id,
            permissions: row.permissions.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_groups_collapse() {
        let user: User = UserRow {
            id: "u1".into(),
            name: "Alice".into(),
            groups: vec!["admin".into(), "editor".into(), "admin".into()],
            password_hash: None,
        }
        .into();
        assert_eq!(user.groups.len(), 2);
        assert!(user.groups.contains("admin"));
    }
}
