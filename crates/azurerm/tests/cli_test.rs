#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "ARM_SUBSCRIPTION_ID",
    "ARM_CLIENT_ID",
    "ARM_CLIENT_SECRET",
    "ARM_TENANT_ID",
    "ARM_ACCESS_TOKEN",
    "ARM_MANAGEMENT_URL",
    "ARM_SKIP_PROVIDER_REGISTRATION",
    "AZURERM_CONFIG_PATH",
    "AZURERM_PROJECT_DIR",
];

/// `azurerm` を一時ディレクトリで、ホストの認証情報なしに実行する
fn azurerm(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("azurerm").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn write_definition(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("storage.yaml");
    std::fs::write(&path, body).unwrap();
    path
}

const VALID: &str = r#"
name: acctest01
resource_group_name: acctestrg
location: West US
account_type: standard_grs
custom_domain:
  - name: static.example.com
tags:
  environment: production
"#;

/// 作成済みの状態を state.json に直接書き込む
fn seed_state(dir: &Path, location: &str) {
    let id = "/subscriptions/sub/resourceGroups/acctestrg/providers/Microsoft.Storage/storageAccounts/acctest01";
    let state = serde_json::json!({
        "version": 1,
        "updated_at": "2026-01-01T00:00:00Z",
        "resources": {
            "azurerm_storage_account.acctest01": {
                "id": id,
                "resource_type": "azurerm_storage_account",
                "status": "created",
                "attributes": {
                    "id": id,
                    "name": "acctest01",
                    "resource_group_name": "acctestrg",
                    "location": location,
                    "account_type": "Standard_GRS",
                    "custom_domain": [{ "name": "static.example.com", "use_subdomain": false }],
                    "tags": { "environment": "production" }
                },
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z"
            }
        }
    });
    std::fs::create_dir_all(dir.join(".azurerm")).unwrap();
    std::fs::write(
        dir.join(".azurerm/state.json"),
        serde_json::to_string_pretty(&state).unwrap(),
    )
    .unwrap();
}

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    azurerm(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Azure Storage Account"))
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("read"))
        .stdout(predicate::str::contains("delete"));
}

/// バージョン表示
#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    azurerm(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("azurerm"));
}

/// 不明なサブコマンドはエラー
#[test]
fn test_unknown_command() {
    let dir = TempDir::new().unwrap();
    azurerm(dir.path()).arg("apply").assert().failure();
}

#[test]
fn test_validate_valid_definition() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(dir.path(), VALID);

    azurerm(dir.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("定義は正常です"))
        .stdout(predicate::str::contains("westus"))
        .stdout(predicate::str::contains("Standard_GRS"));
}

/// 不正な名前と種別はすべて報告される
#[test]
fn test_validate_reports_every_error() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(
        dir.path(),
        "name: Bad_Name\nresource_group_name: rg\nlocation: westus\naccount_type: invalid\n",
    );

    azurerm(dir.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("定義エラー"))
        .stderr(predicate::str::contains("name"))
        .stderr(predicate::str::contains("account_type"));
}

#[test]
fn test_validate_accepts_json() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("storage.json");
    std::fs::write(
        &file,
        r#"{"name":"acctest01","resource_group_name":"rg","location":"eastus","account_type":"Premium_LRS"}"#,
    )
    .unwrap();

    azurerm(dir.path())
        .arg("validate")
        .arg(&file)
        .assert()
        .success();
}

#[test]
fn test_plan_without_state_is_create() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(dir.path(), VALID);

    azurerm(dir.path())
        .arg("plan")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("+ azurerm_storage_account.acctest01: create"));
}

#[test]
fn test_plan_matching_state_is_noop() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(dir.path(), VALID);
    seed_state(dir.path(), "westus");

    azurerm(dir.path())
        .arg("plan")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("変更はありません"));
}

/// ロケーションの変更は再作成
#[test]
fn test_plan_location_change_requires_replace() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(dir.path(), VALID);
    seed_state(dir.path(), "eastus");

    azurerm(dir.path())
        .arg("plan")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("-/+"))
        .stdout(predicate::str::contains("location"));
}

#[test]
fn test_update_rejects_force_new_change() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(dir.path(), VALID);
    seed_state(dir.path(), "eastus");

    azurerm(dir.path())
        .arg("update")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("location"));
}

#[test]
fn test_state_lists_resources() {
    let dir = TempDir::new().unwrap();
    azurerm(dir.path())
        .arg("state")
        .assert()
        .success()
        .stdout(predicate::str::contains("管理中のリソースはありません"));

    seed_state(dir.path(), "westus");
    azurerm(dir.path())
        .arg("state")
        .assert()
        .success()
        .stdout(predicate::str::contains("azurerm_storage_account.acctest01"))
        .stdout(predicate::str::contains("created"));
}

/// 作成後の読み戻しに失敗したエントリ
fn seed_tainted_state(dir: &Path) {
    let id = "/subscriptions/sub/resourceGroups/acctestrg/providers/Microsoft.Storage/storageAccounts/acctest01";
    let state = serde_json::json!({
        "version": 1,
        "updated_at": "2026-01-01T00:00:00Z",
        "resources": {
            "azurerm_storage_account.acctest01": {
                "id": id,
                "resource_type": "azurerm_storage_account",
                "status": "tainted",
                "attributes": null,
                "created_at": "2026-01-01T00:00:00Z",
                "updated_at": "2026-01-01T00:00:00Z"
            }
        }
    });
    std::fs::create_dir_all(dir.join(".azurerm")).unwrap();
    std::fs::write(
        dir.join(".azurerm/state.json"),
        serde_json::to_string_pretty(&state).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_tainted_entry_keeps_id_and_blocks_changes() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(dir.path(), VALID);
    seed_tainted_state(dir.path());

    azurerm(dir.path())
        .arg("state")
        .assert()
        .success()
        .stdout(predicate::str::contains("[tainted]"))
        .stdout(predicate::str::contains("storageAccounts/acctest01"));

    azurerm(dir.path())
        .arg("plan")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("tainted"))
        .stdout(predicate::str::contains("azurerm read acctest01"));

    azurerm(dir.path())
        .arg("update")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tainted"));

    // 再作成はしない
    azurerm(dir.path())
        .arg("create")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("既に作成済み"));
}

#[test]
fn test_read_unknown_resource() {
    let dir = TempDir::new().unwrap();
    azurerm(dir.path())
        .arg("read")
        .arg("acctest01")
        .assert()
        .failure()
        .stderr(predicate::str::contains("state に存在しません"));
}

/// 認証情報がなければリモート呼び出し前に失敗する
#[test]
fn test_create_without_credentials() {
    let dir = TempDir::new().unwrap();
    let file = write_definition(dir.path(), VALID);

    azurerm(dir.path())
        .arg("create")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("subscription_id"));

    // 失敗時に lock が残らない
    assert!(!dir.path().join(".azurerm/lock.json").exists());
}
