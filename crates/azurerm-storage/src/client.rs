//! Azure Resource Manager REST client
//!
//! Talks to the management API directly with a bearer token. Acquiring the
//! token is left to the caller (`ARM_ACCESS_TOKEN`).

use crate::api::{Account, AccountCreateParameters, CreateOutcome, StorageAccountsApi};
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use azurerm_cloud::{
    OperationResponse, PollAsNeeded, PollingConfig, ProviderRegistrationApi, RemoteError,
    Sleeper, TokioSleeper, status,
};
use azurerm_config::ProviderConfig;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

const STORAGE_API_VERSION: &str = "2015-06-15";
const RESOURCES_API_VERSION: &str = "2015-01-01";
/// Floor for every poll delay; `Retry-After: 0` would otherwise never advance the window
const MIN_POLL_DELAY: Duration = Duration::from_secs(1);

/// ARM client for storage accounts and provider registration
pub struct ArmClient {
    http: reqwest::Client,
    base_url: String,
    subscription_id: String,
    access_token: String,
    polling: PollingConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl ArmClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let access_token = config
            .access_token
            .clone()
            .ok_or(StorageError::MissingAccessToken)?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("azurerm/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.management_url().to_string(),
            subscription_id: config.subscription_id.clone(),
            access_token,
            polling: PollingConfig::default(),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    fn storage_account_path(&self, resource_group: &str, name: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Storage/storageAccounts/{}",
            self.subscription_id, resource_group, name
        )
    }

    fn url(&self, path: &str, api_version: &str) -> String {
        format!("{}{}?api-version={}", self.base_url, path, api_version)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> std::result::Result<reqwest::Response, RemoteError> {
        request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| RemoteError::transport(e.to_string()))
    }

    /// GET the poll URL once and fold the result into a new operation response
    async fn poll_once(
        &self,
        current: &OperationResponse,
    ) -> std::result::Result<OperationResponse, RemoteError> {
        let url = current.poll_url.as_deref().ok_or_else(|| {
            RemoteError::transport(format!(
                "operation on {} was accepted without a polling location",
                current.request_path
            ))
        })?;

        tracing::debug!("Polling {}", url);
        let response = self.send(self.http.get(url)).await?;
        let code = response.status().as_u16();
        let poll_url = poll_location(&response).or_else(|| current.poll_url.clone());
        let retry_after = retry_after(&response);
        let body = response.text().await.unwrap_or_default();

        // An Azure-AsyncOperation endpoint answers 200 with the status in the body
        let code = match serde_json::from_str::<AsyncOperationStatus>(&body) {
            Ok(op) if code == status::OK => match op.status.as_str() {
                "InProgress" | "Accepted" | "Running" => status::ACCEPTED,
                "Succeeded" => status::OK,
                _ => return Err(RemoteError::new(code, api_error_message(&body))),
            },
            _ => code,
        };

        Ok(OperationResponse {
            status: code,
            request_path: current.request_path.clone(),
            poll_url,
            retry_after,
        })
    }
}

#[async_trait]
impl StorageAccountsApi for ArmClient {
    async fn create(
        &self,
        resource_group: &str,
        name: &str,
        params: &AccountCreateParameters,
    ) -> std::result::Result<CreateOutcome, RemoteError> {
        let path = self.storage_account_path(resource_group, name);
        tracing::debug!("PUT {}", path);

        let response = self
            .send(self.http.put(self.url(&path, STORAGE_API_VERSION)).json(params))
            .await?;

        match response.status().as_u16() {
            status::OK => Ok(CreateOutcome::Completed),
            status::ACCEPTED => {
                let mut operation = OperationResponse::new(status::ACCEPTED, path);
                operation.poll_url = poll_location(&response);
                operation.retry_after = retry_after(&response);
                Ok(CreateOutcome::Accepted(operation))
            }
            code => Err(error_from_body(code, response).await),
        }
    }

    async fn get_properties(
        &self,
        resource_group: &str,
        name: &str,
    ) -> std::result::Result<Account, RemoteError> {
        let path = self.storage_account_path(resource_group, name);
        tracing::debug!("GET {}", path);

        let response = self
            .send(self.http.get(self.url(&path, STORAGE_API_VERSION)))
            .await?;

        match response.status().as_u16() {
            status::OK => response
                .json::<Account>()
                .await
                .map_err(|e| RemoteError::new(status::OK, format!("invalid response body: {}", e))),
            code @ (status::NO_CONTENT | status::NOT_FOUND) => Err(RemoteError::new(
                code,
                format!("storage account {:?} not found", name),
            )),
            code => Err(error_from_body(code, response).await),
        }
    }

    async fn delete(&self, resource_group: &str, name: &str) -> std::result::Result<(), RemoteError> {
        let path = self.storage_account_path(resource_group, name);
        tracing::debug!("DELETE {}", path);

        let response = self
            .send(self.http.delete(self.url(&path, STORAGE_API_VERSION)))
            .await?;

        match response.status().as_u16() {
            status::OK | status::NO_CONTENT => Ok(()),
            code => Err(error_from_body(code, response).await),
        }
    }
}

#[async_trait]
impl PollAsNeeded for ArmClient {
    async fn poll_as_needed(
        &self,
        response: &OperationResponse,
        acceptable_codes: &[u16],
    ) -> std::result::Result<OperationResponse, RemoteError> {
        let mut current = response.clone();
        let mut waited = Duration::ZERO;

        while current.status == status::ACCEPTED {
            if waited >= self.polling.duration {
                return Err(RemoteError::new(
                    status::ACCEPTED,
                    format!(
                        "operation on {} still in progress after {:?}",
                        current.request_path, waited
                    ),
                ));
            }

            let delay = current
                .retry_after
                .unwrap_or(self.polling.delay)
                .max(MIN_POLL_DELAY);
            self.sleeper.sleep(delay).await;
            waited += delay;

            current = self.poll_once(&current).await?;
        }

        if acceptable_codes.contains(&current.status) {
            Ok(current)
        } else {
            Err(RemoteError::new(
                current.status,
                format!("unexpected status for operation on {}", current.request_path),
            ))
        }
    }
}

#[async_trait]
impl ProviderRegistrationApi for ArmClient {
    async fn register(&self, namespace: &str) -> std::result::Result<u16, RemoteError> {
        let path = format!(
            "/subscriptions/{}/providers/{}/register",
            self.subscription_id, namespace
        );
        tracing::debug!("POST {}", path);

        let response = self
            .send(self.http.post(self.url(&path, RESOURCES_API_VERSION)))
            .await?;
        Ok(response.status().as_u16())
    }
}

fn poll_location(response: &reqwest::Response) -> Option<String> {
    ["Azure-AsyncOperation", "Location"]
        .iter()
        .find_map(|name| response.headers().get(*name))
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

async fn error_from_body(code: u16, response: reqwest::Response) -> RemoteError {
    let body = response.text().await.unwrap_or_default();
    RemoteError::new(code, api_error_message(&body))
}

/// Extract `code: message` from an ARM error body, falling back to the raw text
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { error: Some(err) }) => format!("{}: {}", err.code, err.message),
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AsyncOperationStatus {
    status: String,
}
