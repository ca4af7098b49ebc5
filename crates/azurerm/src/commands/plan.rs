use crate::utils::{self, Context};
use azurerm_cloud::ChangeType;
use azurerm_storage::classify_change;
use colored::Colorize;
use std::path::Path;

/// Compare the definition with the recorded state; never calls the API
pub async fn handle(ctx: &Context, file: &Path) -> anyhow::Result<()> {
    let desired = utils::load_desired(file)?;
    let state = ctx.state_manager().load().await?;
    let recorded = utils::recorded(&state, &desired.name)?;

    if let Some(tainted) = recorded.as_ref().filter(|r| r.observed.is_none()) {
        println!(
            "{}",
            format!("! {} ({}) は {} です", desired.name, tainted.id, tainted.status).red()
        );
        println!(
            "{}",
            format!(
                "先に `azurerm read {}` でリモートの状態を取り込んでください",
                desired.name
            )
            .yellow()
        );
        return Ok(());
    }

    let observed = recorded.and_then(|r| r.observed);

    let change = classify_change(&desired, observed.as_ref());
    let line = change.to_string();
    let line = match change.change_type {
        ChangeType::Create => format!("+ {}", line).green(),
        ChangeType::Replace => format!("-/+ {}", line).red(),
        ChangeType::Update => format!("~ {}", line).yellow(),
        ChangeType::NoOp => format!("  {}", line).dimmed(),
    };
    println!("{}", line);

    match change.change_type {
        ChangeType::Replace => {
            println!();
            println!(
                "{}",
                "再作成が必要です: `azurerm delete` の後に `azurerm create` を実行してください"
                    .yellow()
            );
        }
        ChangeType::NoOp => println!("{}", "変更はありません".green()),
        _ => {}
    }

    Ok(())
}
