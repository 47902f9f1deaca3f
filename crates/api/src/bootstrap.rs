//! Startup provisioning: load the initial wiki and guarantee an admin login.

use quire_core::directory::{Group, User};
use quire_core::roles::GROUP_ADMIN;
use quire_core::snapshot::{self, ImportReport, WikiSnapshot};
use quire_core::store::{DirectoryStore, WikiStore};
use quire_core::types::GroupSet;

use crate::auth::password::hash_password;
use crate::config::{BootstrapAdmin, ServerConfig};

/// Import `SEED_PATH` if configured, the built-in seed otherwise.
///
/// Entities already present in the store are left untouched, so restarting
/// against a persistent backend is safe.
pub async fn load_initial_data(
    store: &dyn WikiStore,
    config: &ServerConfig,
) -> anyhow::Result<ImportReport> {
    let document = match &config.seed_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading wiki snapshot");
            WikiSnapshot::from_path(path, &config.default_section).await?
        }
        None => snapshot::seed(),
    };

    let report = snapshot::import(store, document).await?;
    for (section_id, warning) in &report.warnings {
        tracing::warn!(section_id = %section_id, warning = %warning, "Section configuration warning");
    }
    tracing::info!(
        users = report.users,
        groups = report.groups,
        sections = report.sections,
        pages = report.pages,
        "Initial data imported"
    );
    Ok(report)
}

/// Make sure `admin.user_id` exists, belongs to `admin`, and logs in with
/// `admin.password`. Other memberships of an existing user are kept.
pub async fn ensure_admin(store: &dyn WikiStore, admin: &BootstrapAdmin) -> anyhow::Result<User> {
    if store.find_group(GROUP_ADMIN).await?.is_none() {
        store
            .insert_group(&Group {
                id: GROUP_ADMIN.to_string(),
                permissions: ["read", "write", "delete", "manage"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            })
            .await?;
    }

    let password_hash = hash_password(&admin.password)
        .map_err(|e| anyhow::anyhow!("Failed to hash bootstrap admin password: {e}"))?;

    let user = match store.find_user(&admin.user_id).await? {
        Some(mut user) => {
            user.groups.insert(GROUP_ADMIN.to_string());
            user.password_hash = Some(password_hash);
            store.update_user(&user).await?;
            user
        }
        None => {
            let user = User {
                id: admin.user_id.clone(),
                name: admin.user_id.clone(),
                groups: GroupSet::from([GROUP_ADMIN.to_string()]),
                password_hash: Some(password_hash),
            };
            store.insert_user(&user).await?;
            user
        }
    };

    tracing::info!(user_id = %user.id, "Bootstrap admin ready");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use quire_core::store::memory::MemoryStore;

    use super::*;
    use crate::auth::password::verify_password;

    fn admin(user_id: &str) -> BootstrapAdmin {
        BootstrapAdmin {
            user_id: user_id.to_string(),
            password: "correct-horse".to_string(),
        }
    }

    #[tokio::test]
    async fn creates_missing_admin_and_group() {
        let store = MemoryStore::new();
        let user = ensure_admin(&store, &admin("root")).await.unwrap();

        assert!(user.groups.contains(GROUP_ADMIN));
        assert!(store.find_group(GROUP_ADMIN).await.unwrap().is_some());
        let stored = store.find_user("root").await.unwrap().unwrap();
        assert!(verify_password("correct-horse", stored.password_hash.as_deref().unwrap()).unwrap());
    }

    #[tokio::test]
    async fn promotes_existing_user_and_keeps_groups() {
        let store = MemoryStore::new();
        snapshot::import(&store, snapshot::seed()).await.unwrap();

        let user = ensure_admin(&store, &admin("u2")).await.unwrap();
        assert!(user.groups.contains(GROUP_ADMIN));
        assert!(user.groups.contains("editor"));
        assert_eq!(user.name, "Bob");
    }
}
