//! Storage accounts API surface and wire types (api-version 2015-06-15)

use async_trait::async_trait;
use azurerm_cloud::{OperationResponse, RemoteError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The operation continues server-side and must be polled
    Accepted(OperationResponse),
    /// The account was created synchronously
    Completed,
}

/// Remote operations on storage accounts
#[async_trait]
pub trait StorageAccountsApi: Send + Sync {
    async fn create(
        &self,
        resource_group: &str,
        name: &str,
        params: &AccountCreateParameters,
    ) -> Result<CreateOutcome, RemoteError>;

    /// Fetch an account; a missing account is an error with status 204 or 404
    async fn get_properties(&self, resource_group: &str, name: &str)
    -> Result<Account, RemoteError>;

    async fn delete(&self, resource_group: &str, name: &str) -> Result<(), RemoteError>;
}

// ============ Wire Types ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreateParameters {
    pub location: String,
    pub properties: AccountPropertiesCreateParameters,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPropertiesCreateParameters {
    pub account_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub properties: Option<AccountProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProperties {
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub provisioning_state: Option<String>,
    #[serde(default)]
    pub primary_location: Option<String>,
    #[serde(default)]
    pub secondary_location: Option<String>,
    #[serde(default)]
    pub primary_endpoints: Option<Endpoints>,
    #[serde(default)]
    pub secondary_endpoints: Option<Endpoints>,
    #[serde(default)]
    pub custom_domain: Option<CustomDomainProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default)]
    pub blob: Option<String>,
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDomainProperties {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub use_sub_domain: Option<bool>,
}
