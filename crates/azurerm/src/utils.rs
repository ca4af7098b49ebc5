use anyhow::Context as _;
use azurerm_cloud::{
    DEFAULT_PROVIDER_NAMESPACES, NamedLocks, ResourceStatus, StateFile, StateManager, register_all,
    resource_key,
};
use azurerm_config::ProviderConfig;
use azurerm_storage::{
    ArmClient, RESOURCE_TYPE, StorageAccountConfig, StorageAccountResource, StorageAccountState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Options shared by every subcommand
pub struct Context {
    pub project_dir: PathBuf,
    pub skip_provider_registration: bool,
}

impl Context {
    pub fn state_manager(&self) -> StateManager {
        StateManager::new(&self.project_dir)
    }
}

/// Read a storage account definition (YAML or JSON) and validate it
pub fn load_desired(path: &Path) -> anyhow::Result<StorageAccountConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("定義ファイルを読み込めません: {}", path.display()))?;
    // JSON も YAML として読める
    let value: serde_json::Value = serde_yaml::from_str(&content)
        .with_context(|| format!("定義ファイルの解析に失敗: {}", path.display()))?;
    Ok(StorageAccountConfig::decode(value)?)
}

/// Load credentials, build the ARM client and register resource providers
pub async fn connect(ctx: &Context) -> anyhow::Result<Arc<ArmClient>> {
    let config = ProviderConfig::load().context("プロバイダー設定の読み込みに失敗")?;
    let client = Arc::new(ArmClient::new(&config)?);

    if ctx.skip_provider_registration {
        tracing::debug!("Skipping resource provider registration");
    } else {
        register_all(&config, client.as_ref(), DEFAULT_PROVIDER_NAMESPACES).await?;
    }

    Ok(client)
}

pub fn storage_resource(client: Arc<ArmClient>) -> StorageAccountResource<ArmClient> {
    StorageAccountResource::new(client).with_locks(NamedLocks::new())
}

pub fn state_key(name: &str) -> String {
    resource_key(RESOURCE_TYPE, name)
}

/// What the state file holds for one storage account
pub struct Recorded {
    pub id: String,
    pub status: ResourceStatus,
    /// `None` while the account is tainted and was never read back
    pub observed: Option<StorageAccountState>,
}

/// Entry recorded for `name`, if any
pub fn recorded(state: &StateFile, name: &str) -> anyhow::Result<Option<Recorded>> {
    let Some(resource) = state.get_resource(&state_key(name)) else {
        return Ok(None);
    };

    let observed = if resource.status == ResourceStatus::Tainted {
        None
    } else {
        Some(
            resource
                .decode_attributes::<StorageAccountState>()
                .with_context(|| format!("state の {} が壊れています", name))?,
        )
    };

    Ok(Some(Recorded {
        id: resource.id.clone(),
        status: resource.status,
        observed,
    }))
}

/// Like [`recorded`] but a missing entry is an error
pub fn require_recorded(state: &StateFile, name: &str) -> anyhow::Result<Recorded> {
    recorded(state, name)?.ok_or_else(|| {
        anyhow::anyhow!(
            "{} は state に存在しません。先に `azurerm create` を実行してください",
            name
        )
    })
}
