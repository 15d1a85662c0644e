use std::sync::Arc;

use tracing::{info, warn};

use crate::{Error, HashStore, Result};

const BASE_NAMESPACE: &str = "confbot";
const KEY_SEPARATOR: &str = ":";

const PROJECTS: &str = "projects";
const USERS: &str = "users";
const KEYS: &str = "keys";

/// Durable mapping between chat users, their project and its key material.
///
/// Three hashes live under `confbot:<env>`:
///
/// - `projects`: user id -> project id
/// - `users`: project id -> user id
/// - `keys`: project id -> private key bytes
///
/// A user owns at most one project. The `projects` entry is written with a
/// conditional set, so a second registration for the same user fails even
/// when two registrations race.
#[derive(Clone)]
pub struct ProjectRegistry {
    store: Arc<dyn HashStore>,
    namespace: String,
}

impl ProjectRegistry {
    pub fn new(store: Arc<dyn HashStore>, env: &str) -> Self {
        Self {
            store,
            namespace: [BASE_NAMESPACE, env].join(KEY_SEPARATOR),
        }
    }

    fn key(&self, suffix: &str) -> String {
        [self.namespace.as_str(), suffix].join(KEY_SEPARATOR)
    }

    async fn get_string(&self, key: String, field: &str) -> Result<String> {
        match self.store.get(&key, field).await? {
            Some(bytes) => Ok(String::from_utf8(bytes)?),
            None => Err(Error::NotFound {
                key,
                field: field.to_string(),
            }),
        }
    }

    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Register `project_id` as the project of `user_id`.
    ///
    /// Fails with [`Error::AlreadyExists`] (carrying the existing project id)
    /// without touching any entry when the user already has a project. If a
    /// concurrent reset removes that project before it can be read back, the
    /// conflict is still reported, with an empty project id.
    pub async fn register(&self, project_id: &str, user_id: &str) -> Result<()> {
        let projects = self.key(PROJECTS);
        if !self
            .store
            .set_if_absent(&projects, user_id, project_id.as_bytes())
            .await?
        {
            let existing = match self.store.get(&projects, user_id).await? {
                Some(bytes) => String::from_utf8(bytes)?,
                None => String::new(),
            };
            return Err(Error::AlreadyExists {
                user_id: user_id.to_string(),
                project_id: existing,
            });
        }

        self.store
            .set(&self.key(USERS), project_id, user_id.as_bytes())
            .await?;

        info!(user_id, project_id, "registered project");
        Ok(())
    }

    pub async fn project_id_for_user(&self, user_id: &str) -> Result<String> {
        self.get_string(self.key(PROJECTS), user_id).await
    }

    pub async fn user_for_project(&self, project_id: &str) -> Result<String> {
        self.get_string(self.key(USERS), project_id).await
    }

    pub async fn save_key(&self, project_id: &str, private_key: &[u8]) -> Result<()> {
        self.store
            .set(&self.key(KEYS), project_id, private_key)
            .await
    }

    pub async fn key_for_project(&self, project_id: &str) -> Result<Vec<u8>> {
        let key = self.key(KEYS);
        self.store
            .get(&key, project_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                key,
                field: project_id.to_string(),
            })
    }

    /// Forget every project owned by `user_id`.
    ///
    /// Removes the user entry, then scans the whole `users` hash for projects
    /// pointing back at the user. The scan is linear in the number of
    /// registered projects.
    pub async fn reset(&self, user_id: &str) -> Result<()> {
        info!(user_id, "deleting user entry");
        self.store.delete(&self.key(PROJECTS), user_id).await?;

        let users = self.key(USERS);
        for (project_id, owner) in self.store.entries(&users).await? {
            if owner != user_id.as_bytes() {
                continue;
            }
            info!(user_id, project_id = %project_id, "deleting project entry");
            if !self.store.delete(&users, &project_id).await? {
                warn!(user_id, project_id = %project_id, "project entry vanished during reset");
            }
        }

        Ok(())
    }
}
