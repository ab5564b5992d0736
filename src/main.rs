// src/main.rs

use anyhow::Result;
use clap::Parser;
use dbdump::cli::command::{backup_database, list_backups, print_plan, run_daemon};
use dbdump::cli::{Cli, Commands};
use dbdump::config::get_all_config;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志，默认 info，可用 RUST_LOG 覆盖
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    // 加载配置
    let config = match get_all_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            anyhow::bail!(e);
        }
    };

    match cli.command {
        Commands::Backup {
            database,
            table,
            force,
        } => {
            let target = config.target.merge(database, table);
            if backup_database(&config, &target, force).await?.is_none() {
                info!("Nothing to do");
            }
            Ok(())
        }
        Commands::Daemon => run_daemon(&config).await,
        Commands::Plan { database, table } => {
            let target = config.target.merge(database, table);
            print_plan(&config, &target)
        }
        Commands::List => list_backups(&config).await,
        Commands::Version => {
            println!("dbdump v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
