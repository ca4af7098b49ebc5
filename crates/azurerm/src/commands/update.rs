use crate::utils::{self, Context};
use azurerm_cloud::ChangeType;
use azurerm_storage::classify_change;
use colored::Colorize;
use std::path::Path;

pub async fn handle(ctx: &Context, file: &Path) -> anyhow::Result<()> {
    let desired = utils::load_desired(file)?;
    let state = ctx.state_manager().load().await?;
    let recorded = utils::require_recorded(&state, &desired.name)?;
    let Some(observed) = recorded.observed else {
        anyhow::bail!(
            "{} は {} です。先に `azurerm read {}` を実行してください",
            desired.name,
            recorded.status,
            desired.name
        );
    };
    let id = recorded.id;

    let change = classify_change(&desired, Some(&observed));
    match change.change_type {
        ChangeType::NoOp => {
            println!("{}", "変更はありません".green());
            return Ok(());
        }
        ChangeType::Replace => anyhow::bail!(
            "{} はその場で変更できません（再作成が必要）",
            change.fields.join(", ")
        ),
        _ => {}
    }

    let client = utils::connect(ctx).await?;
    let resource = utils::storage_resource(client);
    resource.update(&id, &desired).await?;

    println!("{} {}", "✓".green(), change);
    println!(
        "  {}",
        "変更は次回の `azurerm read` で state に反映されます".dimmed()
    );
    Ok(())
}
