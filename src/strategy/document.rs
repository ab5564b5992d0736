use super::{BackupStrategy, ObjectReport};
use crate::database::introspect::user_databases;
use crate::database::{DocumentSource, SchemaObject};
use crate::error::{BackupError, Stage, StageExt};
use crate::utils::artifact_path;
use std::path::PathBuf;
use tokio::fs;

/// Whole collections as pretty-printed JSON arrays, one file per collection.
pub struct DocumentStrategy<S> {
    source: S,
    /// `None` dumps every non-system database into its own subdirectory.
    database: Option<String>,
    backup_dir: PathBuf,
}

impl<S: DocumentSource> DocumentStrategy<S> {
    pub fn new(source: S, database: Option<String>, backup_dir: PathBuf) -> Self {
        DocumentStrategy {
            source,
            database,
            backup_dir,
        }
    }

    fn target_path(&self, object: &SchemaObject) -> PathBuf {
        let segment = match self.database {
            Some(_) => None,
            None => Some(object.namespace.as_str()),
        };
        artifact_path(&self.backup_dir, segment, &object.name, None, "json")
    }
}

#[async_trait::async_trait]
impl<S: DocumentSource> BackupStrategy for DocumentStrategy<S> {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn connect(&mut self) -> Result<(), BackupError> {
        self.source.open().await.stage(Stage::Connect)
    }

    async fn list_objects(&mut self) -> Result<Vec<SchemaObject>, BackupError> {
        let databases = match &self.database {
            Some(db) => vec![db.clone()],
            None => {
                let names = self
                    .source
                    .list_database_names()
                    .await
                    .stage(Stage::Introspect)?;
                user_databases(names)
            }
        };

        let mut objects = Vec::new();
        for db in &databases {
            let mut collections = self
                .source
                .list_collection_names(db)
                .await
                .stage_for(Stage::Introspect, db)?;
            collections.sort();
            objects.extend(
                collections
                    .iter()
                    .map(|collection| SchemaObject::collection(db, collection)),
            );
        }

        Ok(objects)
    }

    async fn dump_object(&mut self, object: &SchemaObject) -> Result<ObjectReport, BackupError> {
        let qualified = format!("{}.{}", object.namespace, object.name);
        let path = self.target_path(object);

        let documents = self
            .source
            .fetch_all(&object.namespace, &object.name)
            .await
            .stage_for(Stage::Dump, &qualified)?;
        let body = serde_json::to_string_pretty(&documents).stage_for(Stage::Dump, &qualified)?;

        // 目录只在真正要写文件时创建
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .stage_for(Stage::Dump, &qualified)?;
        }
        fs::write(&path, body)
            .await
            .stage_for(Stage::Dump, &qualified)?;

        Ok(ObjectReport {
            object: qualified,
            artifact: path,
            records: documents.len() as u64,
        })
    }

    async fn finalize(&mut self, _completed: bool) -> Result<(), BackupError> {
        self.source.close().await.stage(Stage::Finalize)
    }
}
