use crate::utils::{self, Context};
use azurerm_cloud::ResourceStatus;
use colored::Colorize;
use std::io::Write;

pub async fn handle(ctx: &Context, name: &str, yes: bool) -> anyhow::Result<()> {
    let manager = ctx.state_manager();
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;
    let id = utils::require_recorded(&state, name)?.id;

    if !yes && !confirm(&format!("{} を削除します。よろしいですか？", id))? {
        println!("中止しました");
        return Ok(());
    }

    let client = utils::connect(ctx).await?;
    let resource = utils::storage_resource(client);
    let key = utils::state_key(name);

    // an interrupted delete stays visible in `azurerm state`
    state.mark_resource(&key, ResourceStatus::Deleting);
    manager.save(&state).await?;
    resource.delete(&id).await?;

    state.remove_resource(&key);
    manager.save(&state).await?;
    lock.release().await?;

    println!("{}", format!("✓ {} を削除しました", name).green().bold());
    Ok(())
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [y/N]: ", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
