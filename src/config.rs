use crate::dispatch::EngineKind;
use crate::schedule::TimeWindow;
use crate::utils::resolve_path;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AllConfig {
    pub app: AppConfig,
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub target: TargetConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub backup_dir: String,
    /// mongodb | mysql | postgresql，在分发时解析
    pub engine: String,
    /// 时间窗口，例如 "01:00-05:00"
    pub window: Option<String>,
    pub use_show_create: bool,
    pub check_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// 关系型数据库默认备份的库
    pub database: Option<String>,
    pub schema: Option<String>,
}

/// Optional single-object selectors.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TargetConfig {
    pub database_name: Option<String>,
    pub table_name: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backup_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("~"))
            .join(".dbdump");

        AppConfig {
            backup_dir: backup_dir.display().to_string(),
            engine: "mysql".into(),
            window: None,
            use_show_create: true,
            check_interval_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn get_backup_dir(&self) -> PathBuf {
        let path = resolve_path(&self.backup_dir);
        match path {
            Ok(p) => p,
            Err(_) => AppConfig::default().backup_dir.into(),
        }
    }

    pub fn time_window(&self) -> anyhow::Result<Option<TimeWindow>> {
        self.window.as_deref().map(str::parse).transpose()
    }
}

impl ConnectionConfig {
    pub fn port_for(&self, engine: EngineKind) -> u16 {
        self.port.unwrap_or_else(|| engine.default_port())
    }

    pub fn schema_or_public(&self) -> &str {
        self.schema.as_deref().unwrap_or("public")
    }
}

impl TargetConfig {
    /// CLI selectors win over the file.
    pub fn merge(&self, database_name: Option<String>, table_name: Option<String>) -> TargetConfig {
        TargetConfig {
            database_name: database_name.or_else(|| self.database_name.clone()),
            table_name: table_name.or_else(|| self.table_name.clone()),
        }
    }
}

pub fn get_all_config(config_path: &str) -> anyhow::Result<AllConfig, ConfigError> {
    let config_builder = Config::builder()
        // 加载配置文件
        .add_source(File::with_name(config_path))
        // 环境变量覆盖，例如 DBDUMP_CONNECTION__HOST
        .add_source(
            Environment::with_prefix("DBDUMP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config = config_builder.try_deserialize()?;
    Ok(config)
}
