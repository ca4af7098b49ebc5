use crate::utils::Context;
use azurerm_storage::RESOURCE_TYPE;
use colored::Colorize;

pub async fn handle(ctx: &Context) -> anyhow::Result<()> {
    let state = ctx.state_manager().load().await?;

    let mut count = 0;
    for (key, resource) in state.resources_of_type(RESOURCE_TYPE) {
        count += 1;
        println!("{} [{}]", key.cyan(), resource.status);
        println!("  {}", resource.id);
        println!(
            "  更新: {}",
            resource.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    if count == 0 {
        println!("{}", "管理中のリソースはありません".dimmed());
    }
    Ok(())
}
