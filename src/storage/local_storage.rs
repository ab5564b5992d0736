use super::{ArtifactItem, ARTIFACT_EXTENSIONS};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use glob::glob;
use std::path::Path;
use tokio::fs;

/// Every artifact below `root`, newest first. Keys are relative to `root`.
pub async fn list_artifacts(root: &Path) -> Result<Vec<ArtifactItem>> {
    let mut items = Vec::new();
    if !root.exists() {
        return Ok(items);
    }

    for ext in ARTIFACT_EXTENSIONS {
        let pattern = root.join("**").join(format!("*.{}", ext));
        let pattern = pattern.to_string_lossy();
        let files = glob(&pattern).with_context(|| format!("Invalid glob pattern {}", pattern))?;

        for path in files.flatten() {
            let metadata = fs::metadata(&path).await?;
            if !metadata.is_file() {
                continue;
            }
            let last_modified: DateTime<Local> = metadata
                .modified()
                .context("Failed to get modification time")?
                .into();
            let key = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();

            items.push(ArtifactItem::new(key, last_modified, metadata.len()));
        }
    }

    // 按最后修改时间排序（最新的在前）
    items.sort_by(|a, b| b.cmp(a));
    Ok(items)
}
