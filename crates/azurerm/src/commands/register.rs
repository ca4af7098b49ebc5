use azurerm_cloud::{DEFAULT_PROVIDER_NAMESPACES, register_all};
use azurerm_config::ProviderConfig;
use azurerm_storage::ArmClient;
use colored::Colorize;

pub async fn handle(namespaces: &[String]) -> anyhow::Result<()> {
    let config = ProviderConfig::load()?;
    let client = ArmClient::new(&config)?;

    let namespaces: Vec<&str> = if namespaces.is_empty() {
        DEFAULT_PROVIDER_NAMESPACES.to_vec()
    } else {
        namespaces.iter().map(String::as_str).collect()
    };

    println!(
        "{}",
        format!("{}個のリソースプロバイダーを登録中...", namespaces.len()).blue()
    );
    register_all(&config, &client, &namespaces).await?;

    for namespace in &namespaces {
        println!("  {} {}", "✓".green(), namespace);
    }
    Ok(())
}
