//! Desired and observed state of a storage account

use crate::api::{
    Account, AccountCreateParameters, AccountPropertiesCreateParameters, CustomDomainProperties,
};
use azurerm_cloud::{
    Change, ChangeType, CloudError, ResourceId, Result, account_types_equal,
    normalize_account_type, normalize_location, validate_storage_account_name,
    validate_storage_account_type, validate_tags,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const RESOURCE_TYPE: &str = "azurerm_storage_account";

/// Fields whose change requires destroying and recreating the account
pub const FORCE_NEW_FIELDS: [&str; 3] = ["name", "resource_group_name", "location"];

/// Custom domain attached to the account's blob endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDomain {
    pub name: String,
    #[serde(default)]
    pub use_subdomain: bool,
}

impl CustomDomain {
    pub fn new(name: impl Into<String>, use_subdomain: bool) -> Self {
        Self {
            name: name.into(),
            use_subdomain,
        }
    }

    /// Set identity: hash over the significant fields
    pub fn set_hash(&self) -> u32 {
        let digest = Sha256::digest(format!("{}-{}-", self.name, self.use_subdomain).as_bytes());
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) & 0x7fff_ffff
    }
}

/// Unordered set of custom domains; elements with equal hashes collapse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomDomainSet {
    items: BTreeMap<u32, CustomDomain>,
}

impl CustomDomainSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an identical element was already present
    pub fn insert(&mut self, domain: CustomDomain) -> bool {
        self.items.insert(domain.set_hash(), domain).is_none()
    }

    pub fn contains(&self, domain: &CustomDomain) -> bool {
        self.items.contains_key(&domain.set_hash())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomDomain> {
        self.items.values()
    }
}

impl FromIterator<CustomDomain> for CustomDomainSet {
    fn from_iter<I: IntoIterator<Item = CustomDomain>>(iter: I) -> Self {
        let mut set = Self::new();
        for domain in iter {
            set.insert(domain);
        }
        set
    }
}

impl Serialize for CustomDomainSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.values())
    }
}

impl<'de> Deserialize<'de> for CustomDomainSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let domains = Vec::<CustomDomain>::deserialize(deserializer)?;
        Ok(domains.into_iter().collect())
    }
}

/// User-declared configuration of a storage account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageAccountConfig {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub account_type: String,
    #[serde(default)]
    pub custom_domain: CustomDomainSet,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl StorageAccountConfig {
    /// Decode and validate a configuration block
    pub fn decode(value: serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value).map_err(|e| {
            CloudError::validation(vec![format!("invalid storage account configuration: {}", e)])
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Run every field validator, reporting all problems at once
    pub fn validate(&self) -> Result<()> {
        let mut errors = validate_storage_account_name(&self.name, "name");
        errors.extend(validate_storage_account_type(&self.account_type, "account_type"));
        errors.extend(validate_tags(&self.tags, "tags"));
        if self.resource_group_name.trim().is_empty() {
            errors.push("resource_group_name must not be empty".to_string());
        }
        if normalize_location(&self.location).is_empty() {
            errors.push("location must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CloudError::validation(errors))
        }
    }

    /// Request body for the create call, in canonical form
    pub fn create_parameters(&self) -> AccountCreateParameters {
        AccountCreateParameters {
            location: normalize_location(&self.location),
            properties: AccountPropertiesCreateParameters {
                account_type: normalize_account_type(&self.account_type),
            },
            tags: self.tags.clone(),
        }
    }
}

/// State observed on the last successful read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAccountState {
    pub id: String,
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub account_type: String,
    pub primary_location: Option<String>,
    pub secondary_location: Option<String>,
    pub primary_blob_endpoint: Option<String>,
    pub primary_queue_endpoint: Option<String>,
    pub primary_table_endpoint: Option<String>,
    pub primary_file_endpoint: Option<String>,
    pub secondary_blob_endpoint: Option<String>,
    pub secondary_queue_endpoint: Option<String>,
    pub secondary_table_endpoint: Option<String>,
    #[serde(default)]
    pub custom_domain: CustomDomainSet,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl StorageAccountState {
    /// Project an API response into local state
    ///
    /// Endpoint groups are only filled when the API returns them; the
    /// secondary group additionally requires a secondary location. The API
    /// exposes no secondary file endpoint.
    pub fn project(id: &str, parsed: &ResourceId, name: &str, account: Account) -> Self {
        let props = account.properties.unwrap_or_default();

        let mut state = Self {
            id: id.to_string(),
            name: name.to_string(),
            resource_group_name: parsed.resource_group.clone(),
            location: account
                .location
                .as_deref()
                .map(normalize_location)
                .unwrap_or_default(),
            account_type: props.account_type.unwrap_or_default(),
            primary_location: props.primary_location,
            secondary_location: props.secondary_location,
            tags: account.tags.unwrap_or_default(),
            ..Default::default()
        };

        if let Some(primary) = props.primary_endpoints {
            state.primary_blob_endpoint = primary.blob;
            state.primary_queue_endpoint = primary.queue;
            state.primary_table_endpoint = primary.table;
            state.primary_file_endpoint = primary.file;
        }

        if state.secondary_location.is_some() {
            if let Some(secondary) = props.secondary_endpoints {
                state.secondary_blob_endpoint = secondary.blob;
                state.secondary_queue_endpoint = secondary.queue;
                state.secondary_table_endpoint = secondary.table;
            }
        }

        if let Some(CustomDomainProperties {
            name: Some(domain_name),
            use_sub_domain,
        }) = props.custom_domain
        {
            state
                .custom_domain
                .insert(CustomDomain::new(domain_name, use_sub_domain.unwrap_or(false)));
        }

        state
    }
}

/// Decide what a reconcile of `desired` against `observed` has to do
///
/// Locations are compared in canonical form and account types
/// case-insensitively, matching what the API echoes back.
pub fn classify_change(
    desired: &StorageAccountConfig,
    observed: Option<&StorageAccountState>,
) -> Change {
    let Some(observed) = observed else {
        return Change::new(ChangeType::Create, RESOURCE_TYPE, &desired.name);
    };

    let replace: Vec<&str> = FORCE_NEW_FIELDS
        .into_iter()
        .filter(|field| match *field {
            "name" => desired.name != observed.name,
            "resource_group_name" => desired.resource_group_name != observed.resource_group_name,
            "location" => normalize_location(&desired.location) != observed.location,
            _ => false,
        })
        .collect();

    if !replace.is_empty() {
        return Change::new(ChangeType::Replace, RESOURCE_TYPE, &desired.name).with_fields(replace);
    }

    let mut update = Vec::new();
    if !account_types_equal(&desired.account_type, &observed.account_type) {
        update.push("account_type");
    }
    if desired.custom_domain != observed.custom_domain {
        update.push("custom_domain");
    }
    if desired.tags != observed.tags {
        update.push("tags");
    }

    if update.is_empty() {
        Change::new(ChangeType::NoOp, RESOURCE_TYPE, &desired.name)
    } else {
        Change::new(ChangeType::Update, RESOURCE_TYPE, &desired.name).with_fields(update)
    }
}
