//! Credential cache used to pre-fill the login form.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, io::ErrorKind, path::PathBuf};
use tokio::{
    fs,
    io::{AsyncWriteExt, BufWriter},
};

use crate::model::Role;

/// A saved username/password pair plus the remember-me flag that decides
/// whether it survives the login. Stored as plain text; the cache only ever
/// feeds the login form back to the same user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
}

/// Stores credentials per role in a local JSON file (credentials.json).
#[derive(Clone)]
pub struct FileCredentialStore {
    /// Location of the cache on disk.
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a new store backed by the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Key used in the map for the given role.
    fn entry_key(role: Role) -> String {
        format!("login:{}", role.as_str())
    }

    /// Load the entire credential map from disk.
    async fn load_map(&self) -> std::io::Result<HashMap<String, Credential>> {
        match fs::read(&self.path).await {
            Ok(data) => {
                if data.is_empty() {
                    return Ok(HashMap::new());
                }
                serde_json::from_slice(&data)
                    .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e),
        }
    }

    /// Persist the credential map to disk, creating directories if needed.
    async fn save_map(&self, map: &HashMap<String, Credential>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let data = serde_json::to_vec_pretty(map)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        let file = fs::File::create(&self.path).await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&data).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Store or replace the credential for the given role.
    pub async fn save(&self, role: Role, credential: &Credential) -> std::io::Result<()> {
        let mut map = self.load_map().await?;
        map.insert(Self::entry_key(role), credential.clone());
        self.save_map(&map).await
    }

    /// Retrieve the saved credential for the role, if one was remembered.
    ///
    /// A credential stored with `remember_me == false` is treated as absent,
    /// so callers never pre-fill a form the user asked not to keep.
    pub async fn load(&self, role: Role) -> Option<Credential> {
        let map = self.load_map().await.ok()?;
        map.get(&Self::entry_key(role))
            .filter(|c| c.remember_me)
            .cloned()
    }

    /// Remove the stored credential for the role.
    pub async fn clear(&self, role: Role) -> std::io::Result<()> {
        let mut map = self.load_map().await?;
        if map.remove(&Self::entry_key(role)).is_some() {
            self.save_map(&map).await?;
        }
        Ok(())
    }

    /// Apply the remember-me decision after a successful login: save when
    /// the box was ticked, otherwise drop whatever was cached before.
    pub async fn apply_after_login(
        &self,
        role: Role,
        credential: &Credential,
    ) -> std::io::Result<()> {
        if credential.remember_me {
            self.save(role, credential).await
        } else {
            self.clear(role).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred(user: &str, remember: bool) -> Credential {
        Credential {
            username: user.into(),
            password: "pass1".into(),
            remember_me: remember,
        }
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.save(Role::Engineer, &cred("eng1", true)).await.unwrap();
        let loaded = store.load(Role::Engineer).await.unwrap();
        assert_eq!(loaded.username, "eng1");
        assert_eq!(loaded.password, "pass1");
        assert!(loaded.remember_me);
    }

    #[tokio::test]
    async fn test_roles_use_distinct_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.save(Role::Engineer, &cred("eng1", true)).await.unwrap();
        store.save(Role::Manager, &cred("mgr1", true)).await.unwrap();

        assert_eq!(store.load(Role::Engineer).await.unwrap().username, "eng1");
        assert_eq!(store.load(Role::Manager).await.unwrap().username, "mgr1");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.load(Role::Engineer).await.is_none());
    }

    #[tokio::test]
    async fn test_unremembered_credential_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.save(Role::Engineer, &cred("eng1", false)).await.unwrap();
        assert!(store.load(Role::Engineer).await.is_none());
    }

    #[tokio::test]
    async fn test_apply_after_login_clears_when_not_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));

        store.save(Role::Engineer, &cred("eng1", true)).await.unwrap();
        store
            .apply_after_login(Role::Engineer, &cred("eng1", false))
            .await
            .unwrap();
        assert!(store.load(Role::Engineer).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_on_empty_store_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.clear(Role::Manager).await.unwrap();
    }
}
