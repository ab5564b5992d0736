use super::{BackupStrategy, ObjectReport};
use crate::database::introspect::{user_tables, MYSQL_RESERVED_PREFIXES};
use crate::database::{Column, Row, SchemaObject, SqlSource};
use crate::error::{BackupError, Stage, StageExt};
use crate::sql::{format_literal, quote_identifier, QuoteStyle};
use crate::utils::artifact_path;
use std::io;
use std::path::PathBuf;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

const QUOTE: QuoteStyle = QuoteStyle::Backtick;

/// Replayable `DROP`/`CREATE`/`INSERT` statements for one database, in a
/// single `.sql` file per run.
pub struct ReconstructiveStrategy<S> {
    source: S,
    database: String,
    backup_dir: PathBuf,
    timestamp: String,
    use_show_create: bool,
    path: PathBuf,
    output: Option<BufWriter<File>>,
}

impl<S: SqlSource> ReconstructiveStrategy<S> {
    pub fn new(
        source: S,
        database: &str,
        backup_dir: PathBuf,
        timestamp: &str,
        use_show_create: bool,
    ) -> Self {
        let path = artifact_path(&backup_dir, None, database, Some(timestamp), "sql");
        ReconstructiveStrategy {
            source,
            database: database.to_string(),
            backup_dir,
            timestamp: timestamp.to_string(),
            use_show_create,
            path,
            output: None,
        }
    }

    pub fn artifact(&self) -> &PathBuf {
        &self.path
    }

    async fn open_artifact(&mut self) -> io::Result<()> {
        fs::create_dir_all(&self.backup_dir).await?;
        let file = File::create(&self.path).await?;
        self.output = Some(BufWriter::new(file));
        let header = dump_header(&self.database, &self.timestamp);
        self.write(&header).await
    }

    async fn write(&mut self, text: &str) -> io::Result<()> {
        match self.output.as_mut() {
            Some(out) => out.write_all(text.as_bytes()).await,
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "SQL artifact is not open",
            )),
        }
    }

    async fn close_artifact(&mut self, completed: bool) -> io::Result<()> {
        if completed {
            self.write(DUMP_FOOTER).await?;
        }
        if let Some(mut out) = self.output.take() {
            out.shutdown().await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: SqlSource> BackupStrategy for ReconstructiveStrategy<S> {
    fn name(&self) -> &'static str {
        "mysql"
    }

    async fn connect(&mut self) -> Result<(), BackupError> {
        self.source.open().await.stage(Stage::Connect)
    }

    async fn list_objects(&mut self) -> Result<Vec<SchemaObject>, BackupError> {
        let names = self
            .source
            .list_tables(&self.database)
            .await
            .stage(Stage::Introspect)?;

        let mut objects = Vec::new();
        for table in user_tables(names, MYSQL_RESERVED_PREFIXES) {
            let columns = self
                .source
                .describe_columns(&self.database, &table)
                .await
                .stage_for(Stage::Introspect, &table)?;
            objects.push(SchemaObject::table(&self.database, &table, columns));
        }

        // 表结构都拿到了才创建输出文件
        self.open_artifact().await.stage(Stage::Dump)?;
        Ok(objects)
    }

    async fn dump_object(&mut self, object: &SchemaObject) -> Result<ObjectReport, BackupError> {
        let table = object.name.as_str();

        let shown = if self.use_show_create {
            self.source
                .show_create(table)
                .await
                .stage_for(Stage::Introspect, table)?
        } else {
            None
        };
        let create = shown.unwrap_or_else(|| create_table_statement(table, &object.columns));

        self.write(&table_preamble(table, &create))
            .await
            .stage_for(Stage::Dump, table)?;

        let rows = self
            .source
            .fetch_rows(table)
            .await
            .stage_for(Stage::Dump, table)?;
        if !rows.is_empty() {
            self.write(&data_preamble(table))
                .await
                .stage_for(Stage::Dump, table)?;
        }
        for row in &rows {
            let mut line = insert_statement(table, row);
            line.push('\n');
            self.write(&line).await.stage_for(Stage::Dump, table)?;
        }

        Ok(ObjectReport {
            object: table.to_string(),
            artifact: self.path.clone(),
            records: rows.len() as u64,
        })
    }

    async fn finalize(&mut self, completed: bool) -> Result<(), BackupError> {
        let artifact = self.close_artifact(completed).await;
        if !completed && self.path.exists() {
            warn!("Partial SQL dump left at {}", self.path.display());
        }
        let source = self.source.close().await;

        artifact.stage(Stage::Finalize)?;
        source.stage(Stage::Finalize)?;
        if completed {
            info!("Database {} dumped to {}", self.database, self.path.display());
        }
        Ok(())
    }
}

const DUMP_FOOTER: &str = "\nSET FOREIGN_KEY_CHECKS=1;\n";

fn dump_header(database: &str, timestamp: &str) -> String {
    format!(
        "-- {} SQL dump\n-- Database: {}\n-- Dump time: {}\n\nSET FOREIGN_KEY_CHECKS=0;\n",
        env!("CARGO_PKG_NAME"),
        database,
        timestamp
    )
}

fn table_preamble(table: &str, create: &str) -> String {
    let quoted = quote_identifier(table, QUOTE);
    format!(
        "\n--\n-- Table structure for table {quoted}\n--\n\nDROP TABLE IF EXISTS {quoted};\n{};\n",
        create.trim_end().trim_end_matches(';')
    )
}

fn data_preamble(table: &str) -> String {
    format!(
        "\n--\n-- Dumping data for table {}\n--\n\n",
        quote_identifier(table, QUOTE)
    )
}

fn column_definition(column: &Column) -> String {
    let mut definition = format!("{} {}", quote_identifier(&column.name, QUOTE), column.data_type);
    if let Some(length) = column.length {
        definition.push_str(&format!("({})", length));
    }
    if !column.nullable {
        definition.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        definition.push_str(" DEFAULT ");
        definition.push_str(default);
    }
    definition
}

pub fn create_table_statement(table: &str, columns: &[Column]) -> String {
    let body = columns
        .iter()
        .map(column_definition)
        .collect::<Vec<_>>()
        .join(",\n  ");
    format!("CREATE TABLE {} (\n  {}\n)", quote_identifier(table, QUOTE), body)
}

/// Column names come from the row itself so they always match the values.
pub fn insert_statement(table: &str, row: &Row) -> String {
    let columns = row
        .columns
        .iter()
        .map(|c| quote_identifier(c, QUOTE))
        .collect::<Vec<_>>()
        .join(", ");
    let values = row
        .values
        .iter()
        .map(format_literal)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        quote_identifier(table, QUOTE),
        columns,
        values
    )
}
