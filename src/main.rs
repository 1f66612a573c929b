mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::Level;

use cli::{Cli, Commands};
use file_index_cli::config::Config;
use file_index_cli::operations::IndexManager;
use file_index_cli::storage::IndexStore;
use file_index_cli::tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 交互界面只输出警告，避免日志打乱画面
    let level = match (&cli.command, cli.verbose) {
        (None | Some(Commands::Tui { .. }), _) => Level::WARN,
        (_, true) => Level::DEBUG,
        (_, false) => Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = if let Some(config_path) = &cli.config {
        Config::load_from_file(config_path)?
    } else {
        Config::load_or_create_default()?
    };
    if let Some(index_file) = cli.index_file {
        config.storage.index_file = Some(index_file);
    }

    let store = IndexStore::new(config.index_file_path()?);
    tracing::debug!("索引文件: {}", store.path().display());

    match cli.command {
        Some(Commands::Index { path }) => {
            IndexManager::new(&config, store).index(&path).await?;
        }
        Some(Commands::Reindex { path }) => {
            IndexManager::new(&config, store).reindex(&path).await?;
        }
        Some(Commands::Search { query }) => {
            IndexManager::new(&config, store).search(&query.join(" ")).await?;
        }
        Some(Commands::Ext { extension }) => {
            IndexManager::new(&config, store).search_extension(&extension).await?;
        }
        Some(Commands::Info) => {
            IndexManager::new(&config, store).info().await?;
        }
        Some(Commands::Delete { force }) => {
            IndexManager::new(&config, store).delete(force).await?;
        }
        Some(Commands::Tui { root: Some(root) }) => {
            App::new(config, store, Some(root)).run().await?;
        }
        Some(Commands::Tui { root: None }) | None => {
            // 未指定根目录时使用当前目录
            let root = std::env::current_dir().ok();
            App::new(config, store, root).run().await?;
        }
    }

    Ok(())
}
