mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "azurerm")]
#[command(about = "宣言した Azure Storage Account を、そのまま現実にする。", long_about = None)]
struct Cli {
    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    /// state ファイル (.azurerm/state.json) を置くディレクトリ
    #[arg(long, global = true, env = "AZURERM_PROJECT_DIR", default_value = ".")]
    project_dir: PathBuf,

    /// リソースプロバイダーの自動登録をスキップ
    #[arg(long, global = true, env = "ARM_SKIP_PROVIDER_REGISTRATION")]
    skip_provider_registration: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// サブスクリプションにリソースプロバイダーを登録
    Register {
        /// 登録する名前空間（省略時は既定の一覧）
        #[arg(short, long = "namespace")]
        namespaces: Vec<String>,
    },
    /// 定義ファイルを検証（リモート呼び出しなし）
    Validate {
        /// ストレージアカウント定義 (YAML / JSON)
        file: PathBuf,
    },
    /// 定義と state を比較して必要な変更を表示
    Plan {
        /// ストレージアカウント定義 (YAML / JSON)
        file: PathBuf,
    },
    /// ストレージアカウントを作成
    Create {
        /// ストレージアカウント定義 (YAML / JSON)
        file: PathBuf,
    },
    /// リモートから状態を読み直して state を更新
    Read {
        /// ストレージアカウント名
        name: String,
    },
    /// 定義の変更を反映
    Update {
        /// ストレージアカウント定義 (YAML / JSON)
        file: PathBuf,
    },
    /// ストレージアカウントを削除
    Delete {
        /// ストレージアカウント名
        name: String,
        /// 確認なしで削除
        #[arg(short, long)]
        yes: bool,
    },
    /// state に記録されたリソースを一覧表示
    State,
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrへ
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let ctx = utils::Context {
        project_dir: cli.project_dir,
        skip_provider_registration: cli.skip_provider_registration,
    };

    match cli.command {
        Commands::Register { namespaces } => commands::register::handle(&namespaces).await,
        Commands::Validate { file } => commands::validate::handle(&file),
        Commands::Plan { file } => commands::plan::handle(&ctx, &file).await,
        Commands::Create { file } => commands::create::handle(&ctx, &file).await,
        Commands::Read { name } => commands::read::handle(&ctx, &name).await,
        Commands::Update { file } => commands::update::handle(&ctx, &file).await,
        Commands::Delete { name, yes } => commands::delete::handle(&ctx, &name, yes).await,
        Commands::State => commands::state::handle(&ctx).await,
        Commands::Version => {
            println!("azurerm {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
