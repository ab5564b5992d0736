use super::{BackupStrategy, ObjectReport};
use crate::database::introspect::{user_tables, POSTGRES_RESERVED_PREFIXES};
use crate::database::{ByteStream, CopySource, SchemaObject};
use crate::error::{BackupError, Stage, StageExt};
use crate::utils::artifact_path;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Server-side `COPY ... TO STDOUT` piped straight into one CSV per table.
pub struct StreamingStrategy<S> {
    source: S,
    database: String,
    /// Single-table mode when set.
    table: Option<String>,
    backup_dir: PathBuf,
    timestamp: String,
}

impl<S: CopySource> StreamingStrategy<S> {
    pub fn new(
        source: S,
        database: &str,
        table: Option<String>,
        backup_dir: PathBuf,
        timestamp: &str,
    ) -> Self {
        StreamingStrategy {
            source,
            database: database.to_string(),
            table,
            backup_dir,
            timestamp: timestamp.to_string(),
        }
    }
}

/// Copy every chunk into the file; the stream is dropped on return, which
/// ends the copy on the server side.
async fn pipe(mut stream: ByteStream, file: &mut File) -> anyhow::Result<u64> {
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    Ok(written)
}

#[async_trait::async_trait]
impl<S: CopySource> BackupStrategy for StreamingStrategy<S> {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    async fn connect(&mut self) -> Result<(), BackupError> {
        self.source.open().await.stage(Stage::Connect)
    }

    async fn list_objects(&mut self) -> Result<Vec<SchemaObject>, BackupError> {
        let tables = match &self.table {
            Some(table) => {
                let exists = self
                    .source
                    .table_exists(table)
                    .await
                    .stage_for(Stage::Introspect, table)?;
                if !exists {
                    return Err(BackupError::TableNotFound(table.clone()));
                }
                vec![table.clone()]
            }
            None => {
                let names = self.source.list_tables().await.stage(Stage::Introspect)?;
                user_tables(names, POSTGRES_RESERVED_PREFIXES)
            }
        };

        Ok(tables
            .iter()
            .map(|table| SchemaObject::table(&self.database, table, Vec::new()))
            .collect())
    }

    async fn dump_object(&mut self, object: &SchemaObject) -> Result<ObjectReport, BackupError> {
        let table = object.name.as_str();
        let path = artifact_path(&self.backup_dir, None, table, Some(&self.timestamp), "csv");

        // 先打开服务端的流，失败时不留空文件
        let stream = self
            .source
            .copy_out(table)
            .await
            .stage_for(Stage::Dump, table)?;

        fs::create_dir_all(&self.backup_dir)
            .await
            .stage_for(Stage::Dump, table)?;
        let mut file = File::create(&path).await.stage_for(Stage::Dump, table)?;

        let copied = pipe(stream, &mut file).await;
        let closed = file.shutdown().await;
        drop(file);

        if copied.is_err() || closed.is_err() {
            warn!("Partial CSV left at {}", path.display());
        }
        let written = copied.stage_for(Stage::Dump, table)?;
        closed.stage_for(Stage::Dump, table)?;

        Ok(ObjectReport {
            object: table.to_string(),
            artifact: path,
            records: written,
        })
    }

    async fn finalize(&mut self, _completed: bool) -> Result<(), BackupError> {
        self.source.close().await.stage(Stage::Finalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fake::FakeCopyEngine;
    use crate::strategy::execute;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    const TS: &str = "20240309040506";

    fn engine() -> FakeCopyEngine {
        FakeCopyEngine::default()
            .with_table("orders", vec![Ok("id,total\n"), Ok("1,9.50\n2,\"1,000\"\n")])
            .with_table("pg_stat_custom", vec![Ok("x\n")])
            .with_table("users", vec![Ok("id,name\n1,\"O'Brien, Pat\"\n")])
    }

    #[tokio::test]
    async fn test_whole_database_one_csv_per_table() {
        let dir = tempdir().unwrap();
        let source = engine();
        let calls = source.calls.clone();
        let mut strategy =
            StreamingStrategy::new(source, "shop", None, dir.path().to_path_buf(), TS);

        let report = execute(&mut strategy).await.unwrap();

        assert_eq!(report.objects.len(), 2);
        let orders = std::fs::read(dir.path().join("orders-20240309040506.csv")).unwrap();
        assert_eq!(orders, b"id,total\n1,9.50\n2,\"1,000\"\n");
        assert_eq!(report.objects[0].records, orders.len() as u64);
        assert!(dir.path().join("users-20240309040506.csv").exists());
        assert!(!dir.path().join("pg_stat_custom-20240309040506.csv").exists());
        assert_eq!(calls.closes(), 1);
    }

    #[tokio::test]
    async fn test_single_table_only_dumps_that_table() {
        let dir = tempdir().unwrap();
        let mut strategy = StreamingStrategy::new(
            engine(),
            "shop",
            Some("users".into()),
            dir.path().to_path_buf(),
            TS,
        );

        let report = execute(&mut strategy).await.unwrap();

        assert_eq!(report.artifacts().len(), 1);
        assert_eq!(
            std::fs::read_dir(dir.path()).unwrap().count(),
            1,
            "only users should be written"
        );
    }

    #[tokio::test]
    async fn test_missing_table_fails_before_any_stream_or_file() {
        let dir = tempdir().unwrap();
        let source = engine();
        let copies = source.copies.clone();
        let calls = source.calls.clone();
        let root = dir.path().join("dump");
        let mut strategy =
            StreamingStrategy::new(source, "shop", Some("ghost".into()), root.clone(), TS);

        let err = execute(&mut strategy).await.unwrap_err();

        assert!(matches!(err, BackupError::TableNotFound(ref t) if t == "ghost"));
        assert_eq!(err.to_string(), "table not found: ghost");
        assert_eq!(copies.load(Ordering::SeqCst), 0);
        assert!(!root.exists());
        assert_eq!(calls.closes(), 1);
    }

    #[tokio::test]
    async fn test_mid_stream_error_keeps_partial_file() {
        let dir = tempdir().unwrap();
        let source = FakeCopyEngine::default()
            .with_table("events", vec![Ok("id,kind\n1,login\n"), Err("connection reset")]);
        let mut strategy =
            StreamingStrategy::new(source, "shop", None, dir.path().to_path_buf(), TS);

        let err = execute(&mut strategy).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Dump));
        assert_eq!(err.object(), Some("events"));
        assert!(err.to_string().contains("connection reset"));
        let partial = std::fs::read(dir.path().join("events-20240309040506.csv")).unwrap();
        assert_eq!(partial, b"id,kind\n1,login\n");
    }
}
