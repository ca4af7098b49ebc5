//! Storage provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("ARM_ACCESS_TOKEN is not set; obtain a token for the management API first")]
    MissingAccessToken,

    #[error("Provider configuration error: {0}")]
    Config(#[from] azurerm_config::ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cloud error: {0}")]
    Cloud(#[from] azurerm_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, StorageError>;
