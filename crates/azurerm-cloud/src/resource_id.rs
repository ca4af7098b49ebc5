//! Azure Resource Manager resource identifiers
//!
//! An ARM id is a `/`-separated list of key/value segments:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{group}/providers/{namespace}/{type}/{name}
//! ```

use crate::error::{CloudError, Result};
use std::str::FromStr;

/// Parsed ARM resource identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: Option<String>,
    /// Typed name segments in the order they appear (e.g. `storageAccounts` -> `name`)
    pub path: Vec<(String, String)>,
}

impl ResourceId {
    pub fn new(subscription_id: impl Into<String>, resource_group: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            provider: None,
            path: Vec::new(),
        }
    }

    pub fn with_provider(mut self, namespace: impl Into<String>) -> Self {
        self.provider = Some(namespace.into());
        self
    }

    pub fn with_typed_name(mut self, resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        self.path.push((resource_type.into(), name.into()));
        self
    }

    /// Parse an id string
    pub fn parse(id: &str) -> Result<Self> {
        let invalid = |reason: &str| CloudError::InvalidResourceId {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = id.trim().trim_start_matches('/').trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(invalid("identifier is empty"));
        }

        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.len() % 2 != 0 {
            return Err(invalid("the number of path segments is not divisible by 2"));
        }

        let mut subscription_id = None;
        let mut resource_group = None;
        let mut provider = None;
        let mut path = Vec::new();

        for pair in segments.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() || value.is_empty() {
                return Err(invalid("empty path segment"));
            }
            // ARM treats segment keys case-insensitively
            if key.eq_ignore_ascii_case("subscriptions") {
                subscription_id = Some(value.to_string());
            } else if key.eq_ignore_ascii_case("resourceGroups") {
                resource_group = Some(value.to_string());
            } else if key.eq_ignore_ascii_case("providers") {
                provider = Some(value.to_string());
            } else {
                path.push((key.to_string(), value.to_string()));
            }
        }

        Ok(Self {
            subscription_id: subscription_id.ok_or_else(|| invalid("no subscription ID found"))?,
            resource_group: resource_group.ok_or_else(|| invalid("no resource group name found"))?,
            provider,
            path,
        })
    }

    /// Look up the name segment for a resource type (e.g. `storageAccounts`)
    pub fn typed_name(&self, resource_type: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(resource_type))
            .map(|(_, value)| value.as_str())
    }

    /// Like [`typed_name`](Self::typed_name) but reports a missing segment as an error
    pub fn require_typed_name(&self, resource_type: &str) -> Result<&str> {
        self.typed_name(resource_type)
            .ok_or_else(|| CloudError::InvalidResourceId {
                id: self.to_string(),
                reason: format!("no {} segment found", resource_type),
            })
    }

    /// Id of the enclosing resource group
    pub fn resource_group_id(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.resource_group
        )
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.resource_group_id())?;
        if let Some(provider) = &self.provider {
            write!(f, "/providers/{}", provider)?;
        }
        for (key, value) in &self.path {
            write!(f, "/{}/{}", key, value)?;
        }
        Ok(())
    }
}

impl FromStr for ResourceId {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
