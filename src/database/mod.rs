pub mod introspect;
pub mod mongo;
pub mod mysql;
pub mod postgresql;

#[cfg(test)]
pub mod fake;

use crate::sql::SqlValue;
use bytes::Bytes;
use futures::stream::BoxStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Collection,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub length: Option<i64>,
    pub nullable: bool,
    pub default: Option<String>,
}

/// A collection or table that holds data, as found by introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    pub name: String,
    pub kind: ObjectKind,
    /// The database the object lives in.
    pub namespace: String,
    pub columns: Vec<Column>,
}

impl SchemaObject {
    pub fn collection(namespace: &str, name: &str) -> Self {
        SchemaObject {
            name: name.to_string(),
            kind: ObjectKind::Collection,
            namespace: namespace.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn table(namespace: &str, name: &str, columns: Vec<Column>) -> Self {
        SchemaObject {
            name: name.to_string(),
            kind: ObjectKind::Table,
            namespace: namespace.to_string(),
            columns,
        }
    }
}

/// One result row; `columns` comes from the result set itself, not from the
/// catalog, so it always lines up with `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub columns: Vec<String>,
    pub values: Vec<SqlValue>,
}

/// Document store access used by the document strategy.
#[async_trait::async_trait]
pub trait DocumentSource: Send {
    async fn open(&mut self) -> anyhow::Result<()>;
    async fn list_database_names(&mut self) -> anyhow::Result<Vec<String>>;
    async fn list_collection_names(&mut self, database: &str) -> anyhow::Result<Vec<String>>;
    /// Every document of the collection, as relaxed Extended JSON.
    async fn fetch_all(
        &mut self,
        database: &str,
        collection: &str,
    ) -> anyhow::Result<Vec<serde_json::Value>>;
    async fn close(&mut self) -> anyhow::Result<()>;
}

/// Catalog and row access for the reconstructive SQL strategy.
#[async_trait::async_trait]
pub trait SqlSource: Send {
    async fn open(&mut self) -> anyhow::Result<()>;
    async fn list_tables(&mut self, database: &str) -> anyhow::Result<Vec<String>>;
    async fn describe_columns(&mut self, database: &str, table: &str)
        -> anyhow::Result<Vec<Column>>;
    /// The engine's own `CREATE TABLE` text, when it can produce one.
    async fn show_create(&mut self, table: &str) -> anyhow::Result<Option<String>>;
    async fn fetch_rows(&mut self, table: &str) -> anyhow::Result<Vec<Row>>;
    async fn close(&mut self) -> anyhow::Result<()>;
}

pub type ByteStream = BoxStream<'static, anyhow::Result<Bytes>>;

/// Catalog access plus server-side bulk export for the streaming strategy.
#[async_trait::async_trait]
pub trait CopySource: Send {
    async fn open(&mut self) -> anyhow::Result<()>;
    async fn list_tables(&mut self) -> anyhow::Result<Vec<String>>;
    async fn table_exists(&mut self, table: &str) -> anyhow::Result<bool>;
    /// Header line followed by CSV rows, exactly as the server sends them.
    async fn copy_out(&mut self, table: &str) -> anyhow::Result<ByteStream>;
    async fn close(&mut self) -> anyhow::Result<()>;
}
