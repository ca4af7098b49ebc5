//! Resource provider registration
//!
//! Every namespace the provider may need is registered with the subscription
//! at configure time, whether or not the configuration uses it. Registration
//! is idempotent, so a partial run is simply repeated on the next start.

use crate::error::{CloudError, RemoteError, Result, status};
use async_trait::async_trait;
use azurerm_config::ProviderConfig;

/// Namespaces registered on configure
pub const DEFAULT_PROVIDER_NAMESPACES: &[&str] = &[
    "Microsoft.Network",
    "Microsoft.Compute",
    "Microsoft.Cdn",
    "Microsoft.Storage",
];

#[async_trait]
pub trait ProviderRegistrationApi: Send + Sync {
    /// Register a namespace, returning the HTTP status of the response
    async fn register(&self, namespace: &str) -> std::result::Result<u16, RemoteError>;
}

/// Register each namespace in order, stopping at the first failure
pub async fn register_all(
    config: &ProviderConfig,
    api: &dyn ProviderRegistrationApi,
    namespaces: &[&str],
) -> Result<()> {
    for namespace in namespaces {
        tracing::debug!(
            "Registering provider {} with subscription {}",
            namespace,
            config.subscription_id
        );

        let code = api.register(namespace).await.map_err(|err| {
            CloudError::Configuration(format!(
                "Error registering provider {:?} with subscription {:?}: {}",
                namespace, config.subscription_id, err
            ))
        })?;

        if code != status::OK {
            return Err(CloudError::Configuration(format!(
                "Error registering provider {:?} with subscription {:?}: unexpected status {}",
                namespace, config.subscription_id, code
            )));
        }
    }

    tracing::info!("Registered {} resource providers", namespaces.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeProviders {
        responses: HashMap<&'static str, std::result::Result<u16, RemoteError>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProviderRegistrationApi for FakeProviders {
        async fn register(&self, namespace: &str) -> std::result::Result<u16, RemoteError> {
            self.calls.lock().unwrap().push(namespace.to_string());
            self.responses.get(namespace).cloned().unwrap_or(Ok(200))
        }
    }

    fn config() -> ProviderConfig {
        ProviderConfig {
            subscription_id: "sub-1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_registers_all_namespaces() {
        let api = FakeProviders::default();

        register_all(&config(), &api, DEFAULT_PROVIDER_NAMESPACES)
            .await
            .unwrap();

        assert_eq!(*api.calls.lock().unwrap(), DEFAULT_PROVIDER_NAMESPACES);
    }

    #[tokio::test]
    async fn test_non_ok_status_aborts() {
        let mut api = FakeProviders::default();
        api.responses.insert("Microsoft.Compute", Ok(409));

        let err = register_all(&config(), &api, DEFAULT_PROVIDER_NAMESPACES)
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::Configuration(_)));
        assert!(err.to_string().contains("Microsoft.Compute"));
        assert!(err.to_string().contains("sub-1"));
        assert_eq!(
            *api.calls.lock().unwrap(),
            vec!["Microsoft.Network", "Microsoft.Compute"]
        );
    }

    #[tokio::test]
    async fn test_transport_error_aborts() {
        let mut api = FakeProviders::default();
        api.responses
            .insert("Microsoft.Network", Err(RemoteError::transport("dns failure")));

        let err = register_all(&config(), &api, DEFAULT_PROVIDER_NAMESPACES)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("dns failure"));
        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }
}
