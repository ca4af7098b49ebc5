use crate::utils::{self, Context};
use colored::Colorize;

/// Refresh the recorded state from the API
pub async fn handle(ctx: &Context, name: &str) -> anyhow::Result<()> {
    let manager = ctx.state_manager();
    let lock = manager.acquire_lock().await?;
    let mut state = manager.load().await?;
    let id = utils::require_recorded(&state, name)?.id;

    let client = utils::connect(ctx).await?;
    let resource = utils::storage_resource(client);
    let key = utils::state_key(name);

    match resource.read(&id).await? {
        Some(observed) => {
            state.refresh_resource(&key, serde_json::to_value(&observed)?);
            manager.save(&state).await?;
            lock.release().await?;

            println!("{}", serde_json::to_string_pretty(&observed)?);
        }
        None => {
            state.remove_resource(&key);
            manager.save(&state).await?;
            lock.release().await?;

            println!(
                "{}",
                format!("{} はリモートに存在しないため state から削除しました", name).yellow()
            );
        }
    }
    Ok(())
}
