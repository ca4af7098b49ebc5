//! Azure Storage Account resource
//!
//! Maps an [`StorageAccountConfig`] onto the ARM storage-accounts API and
//! reads the result back into a [`StorageAccountState`]. The remote API sits
//! behind [`StorageAccountsApi`] and [`PollAsNeeded`](azurerm_cloud::PollAsNeeded);
//! [`ArmClient`] implements both over HTTP.

pub mod api;
pub mod client;
pub mod error;
pub mod model;
pub mod resource;

pub use api::{
    Account, AccountCreateParameters, AccountProperties, AccountPropertiesCreateParameters,
    CreateOutcome, CustomDomainProperties, Endpoints, StorageAccountsApi,
};
pub use client::ArmClient;
pub use error::{Result, StorageError};
pub use model::{
    CustomDomain, CustomDomainSet, FORCE_NEW_FIELDS, RESOURCE_TYPE, StorageAccountConfig,
    StorageAccountState, classify_change,
};
pub use resource::StorageAccountResource;
