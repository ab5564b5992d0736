use chrono::{DateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};

pub fn resolve_path(path_str: &str) -> Result<PathBuf, String> {
    let resolved_path = if path_str.starts_with("~") {
        let expanded_str = shellexpand::tilde(path_str);
        PathBuf::from(expanded_str.to_string())
    } else {
        PathBuf::from(path_str)
    };

    if resolved_path.exists() {
        fs::canonicalize(&resolved_path).map_err(|e| format!("Could not canonicalize path: {}", e))
    } else {
        Ok(resolved_path)
    }
}

/// Whole-second run stamp used in artifact names.
pub fn run_timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d%H%M%S").to_string()
}

/// `<root>/[<database>/]<object>[-<timestamp>].<ext>`
pub fn artifact_path(
    root: &Path,
    database: Option<&str>,
    object: &str,
    timestamp: Option<&str>,
    ext: &str,
) -> PathBuf {
    let dir = match database {
        Some(db) => root.join(db),
        None => root.to_path_buf(),
    };
    let file_name = match timestamp {
        Some(ts) => format!("{}-{}.{}", object, ts, ext),
        None => format!("{}.{}", object, ext),
    };
    dir.join(file_name)
}
