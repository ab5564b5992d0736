pub mod document;
pub mod reconstructive;
pub mod streaming;

pub use document::DocumentStrategy;
pub use reconstructive::ReconstructiveStrategy;
pub use streaming::StreamingStrategy;

use crate::database::SchemaObject;
use crate::error::BackupError;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// One engine's way of backing up a database.
///
/// `execute` drives the calls in order: `connect`, `list_objects`, then
/// `dump_object` once per object, and always `finalize` at the end, whatever
/// happened before.
#[async_trait::async_trait]
pub trait BackupStrategy: Send {
    fn name(&self) -> &'static str;

    async fn connect(&mut self) -> Result<(), BackupError>;

    async fn list_objects(&mut self) -> Result<Vec<SchemaObject>, BackupError>;

    async fn dump_object(&mut self, object: &SchemaObject) -> Result<ObjectReport, BackupError>;

    /// Release the connection and any open artifact. `completed` is false when
    /// an earlier step failed.
    async fn finalize(&mut self, completed: bool) -> Result<(), BackupError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReport {
    pub object: String,
    pub artifact: PathBuf,
    /// Documents, rows or bytes depending on the engine.
    pub records: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub engine: &'static str,
    pub objects: Vec<ObjectReport>,
}

impl BackupReport {
    /// Distinct artifact paths, in the order they were first written.
    pub fn artifacts(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = Vec::new();
        for object in &self.objects {
            if !paths.contains(&object.artifact.as_path()) {
                paths.push(&object.artifact);
            }
        }
        paths
    }
}

pub async fn execute(strategy: &mut dyn BackupStrategy) -> Result<BackupReport, BackupError> {
    let outcome = drive(strategy).await;
    let closed = strategy.finalize(outcome.is_ok()).await;

    match outcome {
        Ok(report) => closed.map(|_| report),
        Err(e) => {
            if let Err(close_err) = closed {
                error!("Cleanup after failed {} backup also failed: {}", strategy.name(), close_err);
            }
            Err(e)
        }
    }
}

async fn drive(strategy: &mut dyn BackupStrategy) -> Result<BackupReport, BackupError> {
    strategy.connect().await?;

    let objects = strategy.list_objects().await?;
    info!("{}: {} objects to back up", strategy.name(), objects.len());

    let mut report = BackupReport {
        engine: strategy.name(),
        objects: Vec::with_capacity(objects.len()),
    };
    for object in &objects {
        let dumped = strategy.dump_object(object).await?;
        info!(
            "Dumped {} ({} records) to {}",
            dumped.object,
            dumped.records,
            dumped.artifact.display()
        );
        report.objects.push(dumped);
    }

    Ok(report)
}
