//! In-memory sources used by the strategy tests.

use super::{ByteStream, Column, CopySource, DocumentSource, Row, SqlSource};
use anyhow::{anyhow, bail};
use bytes::Bytes;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct Calls {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl Calls {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn open(&self) {
        self.opens.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeDocumentStore {
    pub databases: Vec<(String, Vec<(String, Vec<serde_json::Value>)>)>,
    pub refuse_connection: bool,
    pub fail_collection: Option<String>,
    pub calls: Calls,
}

impl FakeDocumentStore {
    pub fn with_database(
        mut self,
        name: &str,
        collections: Vec<(&str, Vec<serde_json::Value>)>,
    ) -> Self {
        self.databases.push((
            name.to_string(),
            collections
                .into_iter()
                .map(|(c, docs)| (c.to_string(), docs))
                .collect(),
        ));
        self
    }

    fn database(&self, name: &str) -> anyhow::Result<&Vec<(String, Vec<serde_json::Value>)>> {
        self.databases
            .iter()
            .find(|(db, _)| db == name)
            .map(|(_, collections)| collections)
            .ok_or_else(|| anyhow!("no database {}", name))
    }
}

#[async_trait::async_trait]
impl DocumentSource for FakeDocumentStore {
    async fn open(&mut self) -> anyhow::Result<()> {
        self.calls.open();
        if self.refuse_connection {
            bail!("connection refused");
        }
        Ok(())
    }

    async fn list_database_names(&mut self) -> anyhow::Result<Vec<String>> {
        Ok(self.databases.iter().map(|(db, _)| db.clone()).collect())
    }

    async fn list_collection_names(&mut self, database: &str) -> anyhow::Result<Vec<String>> {
        Ok(self
            .database(database)?
            .iter()
            .map(|(c, _)| c.clone())
            .collect())
    }

    async fn fetch_all(
        &mut self,
        database: &str,
        collection: &str,
    ) -> anyhow::Result<Vec<serde_json::Value>> {
        if self.fail_collection.as_deref() == Some(collection) {
            bail!("cursor killed");
        }
        self.database(database)?
            .iter()
            .find(|(c, _)| c == collection)
            .map(|(_, docs)| docs.clone())
            .ok_or_else(|| anyhow!("no collection {}", collection))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.calls.close();
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeTable {
    pub name: String,
    pub columns: Vec<Column>,
    pub create: Option<String>,
    pub rows: Vec<Row>,
}

#[derive(Default)]
pub struct FakeSqlEngine {
    pub tables: Vec<FakeTable>,
    pub fail_rows_for: Option<String>,
    pub fail_listing: bool,
    pub calls: Calls,
}

impl FakeSqlEngine {
    pub fn with_table(mut self, table: FakeTable) -> Self {
        self.tables.push(table);
        self
    }

    fn table(&self, name: &str) -> anyhow::Result<&FakeTable> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| anyhow!("Table '{}' doesn't exist", name))
    }
}

#[async_trait::async_trait]
impl SqlSource for FakeSqlEngine {
    async fn open(&mut self) -> anyhow::Result<()> {
        self.calls.open();
        Ok(())
    }

    async fn list_tables(&mut self, _database: &str) -> anyhow::Result<Vec<String>> {
        if self.fail_listing {
            bail!("information_schema unavailable");
        }
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn describe_columns(
        &mut self,
        _database: &str,
        table: &str,
    ) -> anyhow::Result<Vec<Column>> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn show_create(&mut self, table: &str) -> anyhow::Result<Option<String>> {
        Ok(self.table(table)?.create.clone())
    }

    async fn fetch_rows(&mut self, table: &str) -> anyhow::Result<Vec<Row>> {
        if self.fail_rows_for.as_deref() == Some(table) {
            bail!("Lost connection to MySQL server during query");
        }
        Ok(self.table(table)?.rows.clone())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.calls.close();
        Ok(())
    }
}

/// A chunk the fake copy stream yields: data, or an error message.
pub type Chunk = Result<&'static str, &'static str>;

#[derive(Default)]
pub struct FakeCopyEngine {
    pub tables: Vec<(String, Vec<Chunk>)>,
    pub calls: Calls,
    pub copies: Arc<AtomicUsize>,
}

impl FakeCopyEngine {
    pub fn with_table(mut self, name: &str, chunks: Vec<Chunk>) -> Self {
        self.tables.push((name.to_string(), chunks));
        self
    }
}

#[async_trait::async_trait]
impl CopySource for FakeCopyEngine {
    async fn open(&mut self) -> anyhow::Result<()> {
        self.calls.open();
        Ok(())
    }

    async fn list_tables(&mut self) -> anyhow::Result<Vec<String>> {
        Ok(self.tables.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn table_exists(&mut self, table: &str) -> anyhow::Result<bool> {
        Ok(self.tables.iter().any(|(name, _)| name == table))
    }

    async fn copy_out(&mut self, table: &str) -> anyhow::Result<ByteStream> {
        self.copies.fetch_add(1, Ordering::SeqCst);
        let chunks = self
            .tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, chunks)| chunks.clone())
            .ok_or_else(|| anyhow!("relation \"{}\" does not exist", table))?;

        let items = chunks.into_iter().map(|chunk| match chunk {
            Ok(data) => Ok(Bytes::from_static(data.as_bytes())),
            Err(message) => Err(anyhow!(message)),
        });
        Ok(futures::stream::iter(items).boxed())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.calls.close();
        Ok(())
    }
}
