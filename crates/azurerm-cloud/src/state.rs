//! Persisted resource state
//!
//! Layout under the project root:
//!
//! ```text
//! .azurerm/
//! ├── state.json         resources keyed by `type.name`
//! ├── state.json.backup  previous generation
//! └── lock.json          present while a command mutates state
//! ```

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".azurerm";

/// A lock older than this is treated as left behind by a crashed process
const STALE_LOCK_HOURS: i64 = 1;

/// Key of a resource in the state file (`azurerm_storage_account.example`)
pub fn resource_key(resource_type: &str, name: &str) -> String {
    format!("{}.{}", resource_type, name)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            updated_at: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn set_resource(&mut self, key: String, state: ResourceState) {
        self.resources.insert(key, state);
        self.touch();
    }

    /// Replace the observed attributes of a recorded resource
    ///
    /// Returns `false` when nothing is recorded under `key`.
    pub fn refresh_resource(&mut self, key: &str, attributes: serde_json::Value) -> bool {
        match self.resources.get_mut(key) {
            Some(resource) => {
                resource.refresh(attributes);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Change the lifecycle status of a recorded resource
    ///
    /// Returns `false` when nothing is recorded under `key`.
    pub fn mark_resource(&mut self, key: &str, status: ResourceStatus) -> bool {
        match self.resources.get_mut(key) {
            Some(resource) => {
                resource.status = status;
                resource.updated_at = Utc::now();
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Forget a resource; used both after delete and when it vanished remotely
    pub fn remove_resource(&mut self, key: &str) -> Option<ResourceState> {
        let removed = self.resources.remove(key);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn get_resource(&self, key: &str) -> Option<&ResourceState> {
        self.resources.get(key)
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a ResourceState)> {
        self.resources
            .iter()
            .filter(move |(_, resource)| resource.resource_type == resource_type)
    }
}

/// One managed resource: its ARM id plus the last observed attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    pub id: String,
    pub resource_type: String,
    pub status: ResourceStatus,
    /// Replaced wholesale on every read, never merged
    pub attributes: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>, resource_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            status: ResourceStatus::Created,
            attributes: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: ResourceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn refresh(&mut self, attributes: serde_json::Value) {
        self.attributes = attributes;
        self.status = ResourceStatus::Created;
        self.updated_at = Utc::now();
    }

    /// Decode the attributes into a typed observed state
    pub fn decode_attributes<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.attributes).map_err(|e| {
            CloudError::State(format!("attributes of {} do not decode: {}", self.id, e))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Created,
    /// Delete issued but not yet confirmed
    Deleting,
    /// Exists remotely under the recorded id, attributes never read back
    Tainted,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ResourceStatus::Created => "created",
            ResourceStatus::Deleting => "deleting",
            ResourceStatus::Tainted => "tainted",
        };
        f.write_str(label)
    }
}

/// Reads and writes `.azurerm/state.json`
pub struct StateManager {
    dir: PathBuf,
}

impl StateManager {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            dir: project_root.as_ref().join(STATE_DIR),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Load the state; a missing file is an empty state
    pub async fn load(&self) -> Result<StateFile> {
        let path = self.path("state.json");
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No state at {}, starting empty", path.display());
                return Ok(StateFile::new());
            }
            Err(e) => return Err(e.into()),
        };

        let state: StateFile = serde_json::from_str(&content)
            .map_err(|e| CloudError::State(format!("{} is corrupt: {}", path.display(), e)))?;
        if state.version > STATE_VERSION {
            return Err(CloudError::State(format!(
                "{} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            )));
        }

        tracing::debug!("Loaded {} resources from state", state.resources.len());
        Ok(state)
    }

    /// Write the state atomically, keeping the previous generation as backup
    pub async fn save(&self, state: &StateFile) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.path("state.json");
        let staging = self.path("state.json.tmp");
        fs::write(&staging, serde_json::to_vec_pretty(state)?).await?;

        match fs::copy(&path, self.path("state.json.backup")).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::rename(&staging, &path).await?;

        tracing::debug!("Saved {} resources to state", state.resources.len());
        Ok(())
    }

    /// Take the advisory lock guarding read-modify-write cycles
    pub async fn acquire_lock(&self) -> Result<StateLock> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path("lock.json");

        let holder = LockInfo {
            holder: format!(
                "{}:{}",
                std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
                std::process::id()
            ),
            acquired_at: Utc::now(),
        };
        let body = serde_json::to_vec_pretty(&holder)?;

        // one retry after clearing a stale lock
        for _ in 0..2 {
            let created = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match created {
                Ok(mut file) => {
                    // the body goes through the exclusive handle so nobody sees a partial lock
                    file.write_all(&body).await?;
                    file.sync_all().await?;
                    tracing::debug!("Acquired state lock as {}", holder.holder);
                    return Ok(StateLock {
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let content = match fs::read_to_string(&path).await {
                        Ok(content) => content,
                        // released between our create and this read
                        Err(e) if e.kind() == ErrorKind::NotFound => continue,
                        Err(e) => return Err(e.into()),
                    };
                    let (owner, since) = match serde_json::from_str::<LockInfo>(&content) {
                        Ok(existing) => (existing.holder, existing.acquired_at),
                        Err(_) => {
                            let modified = fs::metadata(&path).await?.modified()?;
                            ("an unreadable lock".to_string(), DateTime::<Utc>::from(modified))
                        }
                    };

                    let age = Utc::now().signed_duration_since(since);
                    if age.num_hours() < STALE_LOCK_HOURS {
                        return Err(CloudError::Lock(format!(
                            "state is locked by {} since {}",
                            owner, since
                        )));
                    }
                    tracing::warn!("Removing stale lock held by {}", owner);
                    fs::remove_file(&path).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CloudError::Lock(format!(
            "could not create {}",
            path.display()
        )))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// Held state lock; dropping it also releases the lock
pub struct StateLock {
    path: PathBuf,
    released: bool,
}

impl StateLock {
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!("Released state lock");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const ID: &str =
        "/subscriptions/s/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/acctest01";

    fn account_state(location: &str) -> ResourceState {
        ResourceState::new(ID, "azurerm_storage_account")
            .with_attributes(json!({ "name": "acctest01", "location": location }))
    }

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let manager = StateManager::new(dir.path());

        let mut state = StateFile::new();
        state.set_resource(
            resource_key("azurerm_storage_account", "acctest01"),
            account_state("westus"),
        );
        state.set_resource(
            resource_key("azurerm_resource_group", "rg"),
            ResourceState::new("/subscriptions/s/resourceGroups/rg", "azurerm_resource_group"),
        );
        manager.save(&state).await.unwrap();

        let loaded = manager.load().await.unwrap();
        let account = loaded.get_resource("azurerm_storage_account.acctest01").unwrap();
        assert_eq!(account.id, ID);
        assert_eq!(account.attributes["location"], "westus");
        assert_eq!(loaded.resources_of_type("azurerm_storage_account").count(), 1);
        assert!(!dir.path().join(".azurerm/state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_backup_holds_previous_generation() {
        let dir = TempDir::new().unwrap();
        let manager = StateManager::new(dir.path());

        let mut state = StateFile::new();
        state.set_resource("azurerm_storage_account.acctest01".into(), account_state("westus"));
        manager.save(&state).await.unwrap();
        state.remove_resource("azurerm_storage_account.acctest01");
        manager.save(&state).await.unwrap();

        let backup = std::fs::read_to_string(dir.path().join(".azurerm/state.json.backup")).unwrap();
        assert!(backup.contains("acctest01"));
        assert!(manager.load().await.unwrap().resources.is_empty());
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_state() {
        let dir = TempDir::new().unwrap();
        let manager = StateManager::new(dir.path());
        assert!(manager.load().await.unwrap().resources.is_empty());

        std::fs::create_dir_all(dir.path().join(".azurerm")).unwrap();
        std::fs::write(dir.path().join(".azurerm/state.json"), "{ not json").unwrap();
        assert!(matches!(manager.load().await, Err(CloudError::State(_))));
    }

    #[tokio::test]
    async fn test_future_version_is_refused() {
        let dir = TempDir::new().unwrap();
        let manager = StateManager::new(dir.path());

        let mut state = StateFile::new();
        state.version = STATE_VERSION + 1;
        manager.save(&state).await.unwrap();

        assert!(matches!(manager.load().await, Err(CloudError::State(_))));
    }

    #[tokio::test]
    async fn test_lock_excludes_second_holder() {
        let dir = TempDir::new().unwrap();
        let manager = StateManager::new(dir.path());

        let lock = manager.acquire_lock().await.unwrap();
        assert!(matches!(manager.acquire_lock().await, Err(CloudError::Lock(_))));

        lock.release().await.unwrap();
        let relocked = manager.acquire_lock().await.unwrap();
        drop(relocked);
        assert!(!dir.path().join(".azurerm/lock.json").exists());
    }

    #[tokio::test]
    async fn test_stale_lock_is_taken_over() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".azurerm")).unwrap();
        let stale = LockInfo {
            holder: "crashed:1".to_string(),
            acquired_at: Utc::now() - chrono::Duration::hours(3),
        };
        std::fs::write(
            dir.path().join(".azurerm/lock.json"),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        let manager = StateManager::new(dir.path());
        tokio_test::assert_ok!(manager.acquire_lock().await);
    }

    #[tokio::test]
    async fn test_lock_being_written_is_respected() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".azurerm")).unwrap();
        // another process has created the file but not written its holder yet
        std::fs::write(dir.path().join(".azurerm/lock.json"), "").unwrap();

        let manager = StateManager::new(dir.path());
        assert!(matches!(manager.acquire_lock().await, Err(CloudError::Lock(_))));
        assert!(dir.path().join(".azurerm/lock.json").exists());
    }

    #[tokio::test]
    async fn test_abandoned_unreadable_lock_is_taken_over() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".azurerm")).unwrap();
        let path = dir.path().join(".azurerm/lock.json");
        std::fs::write(&path, "{ \"holder\":").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(std::time::SystemTime::now() - std::time::Duration::from_secs(3 * 3600))
            .unwrap();

        let manager = StateManager::new(dir.path());
        let lock = manager.acquire_lock().await.unwrap();

        let written: LockInfo =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.holder.ends_with(&format!(":{}", std::process::id())));
        lock.release().await.unwrap();
    }

    #[test]
    fn test_mark_resource() {
        let mut state = StateFile::new();
        let key = resource_key("azurerm_storage_account", "acctest01");
        state.set_resource(key.clone(), account_state("westus"));

        assert!(state.mark_resource(&key, ResourceStatus::Deleting));
        assert!(!state.mark_resource("azurerm_storage_account.other", ResourceStatus::Deleting));
        assert_eq!(state.get_resource(&key).unwrap().status, ResourceStatus::Deleting);
        assert_eq!(ResourceStatus::Deleting.to_string(), "deleting");
    }

    #[test]
    fn test_refresh_replaces_attributes() {
        let mut state = StateFile::new();
        let key = resource_key("azurerm_storage_account", "acctest01");
        state.set_resource(
            key.clone(),
            account_state("westus").with_status(ResourceStatus::Tainted),
        );

        assert!(state.refresh_resource(&key, json!({ "name": "acctest01" })));
        assert!(!state.refresh_resource("azurerm_storage_account.other", json!({})));

        let resource = state.get_resource(&key).unwrap();
        assert_eq!(resource.status, ResourceStatus::Created);
        assert!(resource.attributes.get("location").is_none());
    }

    #[test]
    fn test_decode_attributes() {
        #[derive(Deserialize)]
        struct Observed {
            location: String,
        }

        let observed: Observed = account_state("eastus").decode_attributes().unwrap();
        assert_eq!(observed.location, "eastus");

        let err = account_state("eastus").decode_attributes::<Vec<u8>>().unwrap_err();
        assert!(matches!(err, CloudError::State(_)));
    }
}
