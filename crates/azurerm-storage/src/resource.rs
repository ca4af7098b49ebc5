//! Storage account reconciler
//!
//! ```text
//! Absent ──create──▶ Creating ──poll──▶ Created ──read──▶ Read
//!    ▲                                                     │
//!    └────────────────────── delete / gone ◀───────────────┘
//! ```

use crate::api::{CreateOutcome, StorageAccountsApi};
use crate::model::{StorageAccountConfig, StorageAccountState};
use azurerm_cloud::{
    CloudError, IndefinitePoller, NamedLockGuard, NamedLocks, PollAsNeeded, RemoteError,
    ResourceId, Result, status,
};
use std::sync::Arc;

const RESOURCE_NAME: &str = "Azure Storage Account";
const TYPED_NAME: &str = "storageAccounts";

/// Create/read/update/delete for `azurerm_storage_account`
pub struct StorageAccountResource<C> {
    client: Arc<C>,
    locks: Option<NamedLocks>,
}

impl<C> StorageAccountResource<C>
where
    C: StorageAccountsApi + PollAsNeeded,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            locks: None,
        }
    }

    /// Serialise create and delete calls per resource group
    pub fn with_locks(mut self, locks: NamedLocks) -> Self {
        self.locks = Some(locks);
        self
    }

    async fn lock(&self, resource_group: &str) -> Option<NamedLockGuard> {
        match &self.locks {
            Some(locks) => Some(locks.lock(resource_group).await),
            None => None,
        }
    }

    /// Create the account and return its state as read back from the API
    pub async fn create(&self, desired: &StorageAccountConfig) -> Result<StorageAccountState> {
        desired.validate()?;

        let params = desired.create_parameters();
        let group = desired.resource_group_name.as_str();
        let name = desired.name.as_str();
        let creation_error = |source: RemoteError| CloudError::Creation {
            resource: RESOURCE_NAME,
            name: name.to_string(),
            source,
        };

        tracing::info!("Creating storage account {} in {}", name, params.location);
        let outcome = {
            let _guard = self.lock(group).await;
            self.client
                .create(group, name, &params)
                .await
                .map_err(creation_error)?
        };

        if let CreateOutcome::Accepted(operation) = outcome {
            IndefinitePoller::new(self.client.as_ref())
                .await_completion(&operation, &[status::OK])
                .await
                .map_err(creation_error)?;
        }

        // The create response does not reliably carry the id
        let account = self
            .client
            .get_properties(group, name)
            .await
            .map_err(|source| read_error(name, source))?;
        let id = account.id.ok_or_else(|| {
            read_error(
                name,
                RemoteError::new(status::OK, "response did not include a resource ID"),
            )
        })?;
        tracing::info!("Created storage account {} ({})", name, id);

        // From here on the account exists; failures must still hand back its id
        let read_back = match self.read(&id).await {
            Ok(Some(state)) => return Ok(state),
            Ok(None) => read_error(
                name,
                RemoteError::new(status::NOT_FOUND, "account disappeared right after creation"),
            ),
            Err(err) => err,
        };
        tracing::warn!("Storage account {} was created but could not be read back", name);
        Err(CloudError::Tainted {
            resource: RESOURCE_NAME,
            name: name.to_string(),
            id,
            source: Box::new(read_back),
        })
    }

    /// Fetch the current state; `None` means the account no longer exists
    pub async fn read(&self, id: &str) -> Result<Option<StorageAccountState>> {
        let parsed = ResourceId::parse(id)?;
        let name = parsed.require_typed_name(TYPED_NAME)?;

        match self.client.get_properties(&parsed.resource_group, name).await {
            Ok(account) => Ok(Some(StorageAccountState::project(id, &parsed, name, account))),
            Err(err) if err.is_not_found() => {
                tracing::info!("Storage account {} is gone, clearing local state", name);
                Ok(None)
            }
            Err(source) => Err(read_error(name, source)),
        }
    }

    /// In-place update
    ///
    /// No field is updated in place: the API needs a dedicated call per
    /// mutable field (account type, custom domain, tags) and those calls are
    /// not wired up, so this succeeds without touching the remote account.
    pub async fn update(&self, id: &str, desired: &StorageAccountConfig) -> Result<()> {
        desired.validate()?;
        ResourceId::parse(id)?.require_typed_name(TYPED_NAME)?;
        tracing::debug!("Update of {} requires no remote call", desired.name);
        Ok(())
    }

    /// Delete the account; the API completes deletes synchronously
    pub async fn delete(&self, id: &str) -> Result<()> {
        let parsed = ResourceId::parse(id)?;
        let name = parsed.require_typed_name(TYPED_NAME)?;

        let _guard = self.lock(&parsed.resource_group).await;
        self.client
            .delete(&parsed.resource_group, name)
            .await
            .map_err(|source| CloudError::Deletion {
                resource: RESOURCE_NAME,
                name: name.to_string(),
                source,
            })?;

        tracing::info!("Deleted storage account {}", name);
        Ok(())
    }
}

fn read_error(name: &str, source: RemoteError) -> CloudError {
    CloudError::Read {
        resource: RESOURCE_NAME,
        name: name.to_string(),
        source,
    }
}
