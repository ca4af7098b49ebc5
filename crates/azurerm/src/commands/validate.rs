use crate::utils;
use colored::Colorize;
use std::path::Path;

pub fn handle(file: &Path) -> anyhow::Result<()> {
    println!("{}", "定義を検証中...".blue());

    match utils::load_desired(file) {
        Ok(desired) => {
            println!("{}", "✓ 定義は正常です！".green().bold());
            println!();
            println!("サマリー:");
            println!("  名前: {}", desired.name.cyan());
            println!("  リソースグループ: {}", desired.resource_group_name);
            println!(
                "  ロケーション: {}",
                azurerm_cloud::normalize_location(&desired.location)
            );
            println!(
                "  アカウント種別: {}",
                azurerm_cloud::normalize_account_type(&desired.account_type)
            );
            if !desired.custom_domain.is_empty() {
                for domain in desired.custom_domain.iter() {
                    println!("  カスタムドメイン: {}", domain.name);
                }
            }
            println!("  タグ: {}個", desired.tags.len());
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 定義エラー".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
