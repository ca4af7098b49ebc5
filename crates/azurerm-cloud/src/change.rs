//! Classification of the change between desired and observed state

use serde::{Deserialize, Serialize};

/// What has to happen to bring one resource to its desired state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Nothing exists remotely yet
    Create,
    /// An immutable field differs; destroy and recreate
    Replace,
    /// Only mutable fields differ
    Update,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Create => write!(f, "create"),
            ChangeType::Replace => write!(f, "replace"),
            ChangeType::Update => write!(f, "update"),
            ChangeType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Planned change for a single resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub change_type: ChangeType,

    /// Resource type (e.g. `azurerm_storage_account`)
    pub resource_type: String,

    pub name: String,

    /// Fields that differ; for `Replace`, only the immutable ones
    pub fields: Vec<String>,
}

impl Change {
    pub fn new(
        change_type: ChangeType,
        resource_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            change_type,
            resource_type: resource_type.into(),
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_changes(&self) -> bool {
        self.change_type != ChangeType::NoOp
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}: {}", self.resource_type, self.name, self.change_type)?;
        if !self.fields.is_empty() {
            write!(f, " ({})", self.fields.join(", "))?;
        }
        Ok(())
    }
}
