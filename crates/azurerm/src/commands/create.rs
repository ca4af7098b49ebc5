use crate::utils::{self, Context};
use azurerm_cloud::{ResourceState, ResourceStatus};
use azurerm_storage::RESOURCE_TYPE;
use colored::Colorize;
use std::path::Path;

pub async fn handle(ctx: &Context, file: &Path) -> anyhow::Result<()> {
    let desired = utils::load_desired(file)?;

    let manager = ctx.state_manager();
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;

    if let Some(existing) = utils::recorded(&state, &desired.name)? {
        anyhow::bail!(
            "{} は既に作成済みです ({})。`azurerm read` または `azurerm update` を使ってください",
            desired.name,
            existing.id
        );
    }

    let client = utils::connect(ctx).await?;
    let resource = utils::storage_resource(client);

    println!(
        "{}",
        format!("ストレージアカウント {} を作成中...", desired.name).blue()
    );
    let observed = match resource.create(&desired).await {
        Ok(observed) => observed,
        Err(err) => {
            if let Some(id) = err.created_id() {
                state.set_resource(
                    utils::state_key(&desired.name),
                    ResourceState::new(id, RESOURCE_TYPE).with_status(ResourceStatus::Tainted),
                );
                manager.save(&state).await?;
                lock.release().await?;
                eprintln!(
                    "{}",
                    format!(
                        "{} を tainted として state に記録しました。`azurerm read {}` で状態を取り込んでください",
                        id, desired.name
                    )
                    .yellow()
                );
            }
            return Err(err.into());
        }
    };

    state.set_resource(
        utils::state_key(&desired.name),
        ResourceState::new(&observed.id, RESOURCE_TYPE)
            .with_attributes(serde_json::to_value(&observed)?),
    );
    manager.save(&state).await?;
    lock.release().await?;

    println!("{}", "✓ 作成しました".green().bold());
    println!("  ID: {}", observed.id.cyan());
    if let Some(blob) = &observed.primary_blob_endpoint {
        println!("  Blob: {}", blob);
    }
    Ok(())
}
