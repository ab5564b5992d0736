use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dbdump")]
#[command(about = "MongoDB\\MySQL\\PostgreSQL logical backup tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// Specific file for configuration
    #[arg(short, long)]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one backup with the configured engine
    Backup {
        /// Only this database (overrides [target].database_name)
        #[arg(short, long)]
        database: Option<String>,

        /// Only this table, PostgreSQL only (overrides [target].table_name)
        #[arg(short, long)]
        table: Option<String>,

        /// Ignore the configured time window
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },

    /// Keep running and back up once a day inside the time window
    Daemon,

    /// Show what a backup would do without connecting
    Plan {
        #[arg(short, long)]
        database: Option<String>,

        #[arg(short, long)]
        table: Option<String>,
    },

    /// List backup files under the backup directory
    List,

    /// Show tool version
    Version,
}
