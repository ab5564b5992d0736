//! Engine selection: which strategy runs, and over what scope.
//!
//! Nothing here touches the network or the filesystem; the strategy returned
//! by [`build_strategy`] opens its own connection when executed.

use crate::config::{AllConfig, TargetConfig};
use crate::database::mongo::MongoDb;
use crate::database::mysql::MySql;
use crate::database::postgresql::PostgreSql;
use crate::error::BackupError;
use crate::strategy::{BackupStrategy, DocumentStrategy, ReconstructiveStrategy, StreamingStrategy};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// MongoDB
    DocumentStore,
    /// MySQL, reconstructive SQL dump
    RelationalA,
    /// PostgreSQL, native copy-out
    RelationalB,
}

impl EngineKind {
    pub fn default_port(&self) -> u16 {
        match self {
            EngineKind::DocumentStore => 27017,
            EngineKind::RelationalA => 3306,
            EngineKind::RelationalB => 5432,
        }
    }
}

impl FromStr for EngineKind {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(EngineKind::DocumentStore),
            "mysql" => Ok(EngineKind::RelationalA),
            "pg" | "postgres" | "postgresql" => Ok(EngineKind::RelationalB),
            _ => Err(BackupError::UnsupportedEngine(s.to_string())),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineKind::DocumentStore => "mongodb",
            EngineKind::RelationalA => "mysql",
            EngineKind::RelationalB => "postgresql",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunChoice {
    WholeInstance,
    SingleDatabase,
    SingleTable,
}

pub fn dispatch(engine: EngineKind, has_database: bool, has_table: bool) -> RunChoice {
    match engine {
        EngineKind::DocumentStore if has_database => RunChoice::SingleDatabase,
        EngineKind::DocumentStore => RunChoice::WholeInstance,
        // MySQL 只备份一个库：指定的库或者配置里的库
        EngineKind::RelationalA => RunChoice::SingleDatabase,
        EngineKind::RelationalB if has_table => RunChoice::SingleTable,
        EngineKind::RelationalB => RunChoice::SingleDatabase,
    }
}

/// A dispatch decision with every name it needs resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    pub engine: EngineKind,
    pub choice: RunChoice,
    pub database: Option<String>,
    pub table: Option<String>,
    pub backup_dir: PathBuf,
}

impl fmt::Display for BackupPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = match self.choice {
            RunChoice::WholeInstance => "every non-system database".to_string(),
            RunChoice::SingleDatabase => format!(
                "database `{}`",
                self.database.as_deref().unwrap_or_default()
            ),
            RunChoice::SingleTable => format!(
                "table `{}` in database `{}`",
                self.table.as_deref().unwrap_or_default(),
                self.database.as_deref().unwrap_or_default()
            ),
        };
        write!(f, "{} backup of {} into {}", self.engine, scope, self.backup_dir.display())
    }
}

pub fn plan(config: &AllConfig, target: &TargetConfig) -> Result<BackupPlan, BackupError> {
    let engine: EngineKind = config.app.engine.parse()?;
    let selected_db = target.database_name.clone().filter(|s| !s.is_empty());
    let selected_table = target.table_name.clone().filter(|s| !s.is_empty());
    let choice = dispatch(engine, selected_db.is_some(), selected_table.is_some());

    let database = match engine {
        EngineKind::DocumentStore => selected_db,
        EngineKind::RelationalA | EngineKind::RelationalB => Some(
            selected_db
                .or_else(|| config.connection.database.clone())
                .filter(|s| !s.is_empty())
                .ok_or(BackupError::MissingSetting("connection.database"))?,
        ),
    };
    let table = match choice {
        RunChoice::SingleTable => selected_table,
        _ => {
            if let Some(table) = &selected_table {
                tracing::warn!("Table selector `{}` is ignored for {}", table, engine);
            }
            None
        }
    };

    Ok(BackupPlan {
        engine,
        choice,
        database,
        table,
        backup_dir: config.app.get_backup_dir(),
    })
}

pub fn build_strategy(
    plan: &BackupPlan,
    config: &AllConfig,
    timestamp: &str,
) -> Result<Box<dyn BackupStrategy>, BackupError> {
    let connection = &config.connection;
    let backup_dir = plan.backup_dir.clone();

    let strategy: Box<dyn BackupStrategy> = match plan.engine {
        EngineKind::DocumentStore => Box::new(DocumentStrategy::new(
            MongoDb::new(connection),
            plan.database.clone(),
            backup_dir,
        )),
        EngineKind::RelationalA => {
            let database = plan
                .database
                .as_deref()
                .ok_or(BackupError::MissingSetting("connection.database"))?;
            Box::new(ReconstructiveStrategy::new(
                MySql::new(connection, database),
                database,
                backup_dir,
                timestamp,
                config.app.use_show_create,
            ))
        }
        EngineKind::RelationalB => {
            let database = plan
                .database
                .as_deref()
                .ok_or(BackupError::MissingSetting("connection.database"))?;
            Box::new(StreamingStrategy::new(
                PostgreSql::new(connection, database),
                database,
                plan.table.clone(),
                backup_dir,
                timestamp,
            ))
        }
    };

    Ok(strategy)
}
