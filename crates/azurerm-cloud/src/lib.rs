//! AzureRM reconciliation primitives
//!
//! Provider-independent building blocks shared by every resource type the
//! AzureRM provider manages.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  azurerm CLI                     │
//! │           (register / create / read / delete)    │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               azurerm-storage                    │
//! │   StorageAccountResource   ArmClient (reqwest)   │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               azurerm-cloud                      │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐  │
//! │  │ Validators │ │ Canonical- │ │ Indefinite  │  │
//! │  │            │ │ izer       │ │ Poller      │  │
//! │  └────────────┘ └────────────┘ └─────────────┘  │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐  │
//! │  │ Registrar  │ │ NamedLocks │ │ State file  │  │
//! │  └────────────┘ └────────────┘ └─────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod change;
pub mod error;
pub mod lock;
pub mod normalize;
pub mod poll;
pub mod registrar;
pub mod resource_id;
pub mod state;
pub mod validate;

// Re-exports
pub use change::{Change, ChangeType};
pub use error::{CloudError, RemoteError, Result, status};
pub use lock::{NamedLockGuard, NamedLocks};
pub use normalize::{account_types_equal, normalize_account_type, normalize_location};
pub use poll::{
    IndefinitePoller, OperationResponse, PollAsNeeded, PollState, PollingConfig, Sleeper,
    TokioSleeper,
};
pub use registrar::{DEFAULT_PROVIDER_NAMESPACES, ProviderRegistrationApi, register_all};
pub use resource_id::ResourceId;
pub use state::{ResourceState, ResourceStatus, StateFile, StateLock, StateManager, resource_key};
pub use validate::{
    STORAGE_ACCOUNT_TYPES, validate_storage_account_name, validate_storage_account_type,
    validate_tags,
};
