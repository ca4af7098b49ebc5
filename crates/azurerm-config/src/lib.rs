//! AzureRM プロバイダーの設定
//!
//! サブスクリプション ID とサービスプリンシパルの資格情報を環境変数
//! (`ARM_*`) と YAML 設定ファイルから読み込む。値はリモートクライアントの
//! 構築にのみ使われ、プロバイダー本体では解釈しない。

pub mod error;

pub use error::*;

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_SUBSCRIPTION_ID: &str = "ARM_SUBSCRIPTION_ID";
pub const ENV_CLIENT_ID: &str = "ARM_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "ARM_CLIENT_SECRET";
pub const ENV_TENANT_ID: &str = "ARM_TENANT_ID";
pub const ENV_ACCESS_TOKEN: &str = "ARM_ACCESS_TOKEN";
pub const ENV_MANAGEMENT_URL: &str = "ARM_MANAGEMENT_URL";
pub const ENV_CONFIG_PATH: &str = "AZURERM_CONFIG_PATH";

pub const DEFAULT_MANAGEMENT_URL: &str = "https://management.azure.com";

const CONFIG_FILE: &str = "provider.yaml";

/// プロバイダー設定
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub subscription_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    /// 取得済みのベアラートークン (認証フロー自体は扱わない)
    pub access_token: Option<String>,
    pub management_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("subscription_id", &self.subscription_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("management_url", &self.management_url)
            .finish()
    }
}

impl ProviderConfig {
    /// 環境変数から読み込む。未設定の項目は空のまま
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// YAML 設定ファイルから読み込む
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// 設定ファイル (存在すれば) を読み込み、環境変数で上書きする
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => {
                tracing::debug!("Loading provider config from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(value) = non_empty_var(ENV_SUBSCRIPTION_ID) {
            self.subscription_id = value;
        }
        if let Some(value) = non_empty_var(ENV_CLIENT_ID) {
            self.client_id = value;
        }
        if let Some(value) = non_empty_var(ENV_CLIENT_SECRET) {
            self.client_secret = value;
        }
        if let Some(value) = non_empty_var(ENV_TENANT_ID) {
            self.tenant_id = value;
        }
        if let Some(token) = non_empty_var(ENV_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(url) = non_empty_var(ENV_MANAGEMENT_URL) {
            self.management_url = Some(url);
        }
    }

    /// 必須項目がすべて揃っているか確認する
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&'static str> = [
            ("subscription_id", &self.subscription_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("tenant_id", &self.tenant_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingField(missing))
        }
    }

    /// 管理 API のベース URL (末尾の `/` は除去)
    pub fn management_url(&self) -> &str {
        self.management_url
            .as_deref()
            .unwrap_or(DEFAULT_MANAGEMENT_URL)
            .trim_end_matches('/')
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// AzureRM プロバイダーの設定ディレクトリを取得
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("azurerm"))
        .ok_or(ConfigError::ConfigDirNotFound)
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 AZURERM_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: .azurerm/provider.yaml
/// 3. ~/.config/azurerm/provider.yaml (グローバル設定)
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let local = current_dir.join(".azurerm").join(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
    }

    get_config_dir()
        .ok()
        .map(|dir| dir.join(CONFIG_FILE))
        .filter(|path| path.exists())
}
