use chrono::{DateTime, Local};
use humansize::{format_size, DECIMAL};
use std::cmp::Ordering;
use tabled::settings::Style;
use tabled::{Table, Tabled};

pub mod local_storage;

pub use local_storage::list_artifacts;

/// Backup artifact extensions produced by the three engines.
pub const ARTIFACT_EXTENSIONS: [&str; 3] = ["json", "sql", "csv"];

#[derive(Debug, Tabled, Clone)]
pub struct ArtifactItem {
    #[tabled(rename = "文件路径")]
    pub key: String,
    #[tabled(rename = "修改时间", display_with = "display_time")]
    pub last_modified: DateTime<Local>,
    #[tabled(skip)]
    pub size: u64,
    #[tabled(rename = "大小")]
    pub human_size: String,
}

fn display_time(time: &DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

impl ArtifactItem {
    pub fn new(key: String, last_modified: DateTime<Local>, size: u64) -> Self {
        ArtifactItem {
            key,
            last_modified,
            size,
            human_size: format_size(size, DECIMAL),
        }
    }
}

impl PartialEq for ArtifactItem {
    fn eq(&self, other: &Self) -> bool {
        self.last_modified == other.last_modified && self.key == other.key
    }
}

impl Eq for ArtifactItem {}

impl PartialOrd for ArtifactItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArtifactItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.last_modified
            .cmp(&other.last_modified)
            .then_with(|| self.key.cmp(&other.key))
    }
}

pub fn render_table(items: &[ArtifactItem]) -> String {
    let mut table = Table::new(items);
    table.with(Style::modern());
    table.to_string()
}
