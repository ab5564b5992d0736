use super::{ByteStream, CopySource};
use crate::config::ConnectionConfig;
use crate::dispatch::EngineKind;
use crate::sql::{quote_identifier, QuoteStyle};
use anyhow::anyhow;
use futures::{StreamExt, TryStreamExt};
use std::ops::Deref;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error};

pub struct PostgreSql {
    config: ConnectionConfig,
    database: String,
    client: Option<Client>,
    connection: Option<JoinHandle<()>>,
}

impl Deref for PostgreSql {
    type Target = ConnectionConfig;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

impl PostgreSql {
    pub fn new(config: &ConnectionConfig, database: &str) -> Self {
        PostgreSql {
            config: config.clone(),
            database: database.to_string(),
            client: None,
            connection: None,
        }
    }

    fn client(&self) -> anyhow::Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| anyhow!("PostgreSQL client is not connected"))
    }

    fn pg_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host)
            .port(self.port_for(EngineKind::RelationalB))
            .dbname(&self.database)
            .application_name(env!("CARGO_PKG_NAME"));
        if let Some(username) = &self.username {
            pg.user(username);
        }
        if let Some(password) = &self.password {
            pg.password(password);
        }
        pg
    }

    pub fn copy_statement(schema: &str, table: &str) -> String {
        format!(
            "COPY {}.{} TO STDOUT WITH (FORMAT CSV, HEADER)",
            quote_identifier(schema, QuoteStyle::DoubleQuote),
            quote_identifier(table, QuoteStyle::DoubleQuote)
        )
    }
}

#[async_trait::async_trait]
impl CopySource for PostgreSql {
    async fn open(&mut self) -> anyhow::Result<()> {
        let (client, connection) = self.pg_config().connect(NoTls).await?;

        // 连接对象需要单独运行
        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });
        debug!("Connected to PostgreSQL database {}", self.database);

        self.client = Some(client);
        self.connection = Some(handle);
        Ok(())
    }

    async fn list_tables(&mut self) -> anyhow::Result<Vec<String>> {
        // information_schema 的列是 sql_identifier 域类型，参数显式转成 text
        let schema = self.schema_or_public();
        let rows = self
            .client()?
            .query(
                "SELECT table_name::text FROM information_schema.tables \
                 WHERE table_schema = $1::text AND table_type = 'BASE TABLE' \
                 ORDER BY table_name",
                &[&schema],
            )
            .await?;

        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }

    async fn table_exists(&mut self, table: &str) -> anyhow::Result<bool> {
        let schema = self.schema_or_public();
        let row = self
            .client()?
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = $1::text AND table_name = $2::text)",
                &[&schema, &table],
            )
            .await?;

        Ok(row.get::<_, bool>(0))
    }

    async fn copy_out(&mut self, table: &str) -> anyhow::Result<ByteStream> {
        let statement = Self::copy_statement(self.schema_or_public(), table);
        let stream = self.client()?.copy_out(statement.as_str()).await?;

        Ok(stream.map_err(anyhow::Error::from).boxed())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        // 释放 client 后连接任务自行结束
        drop(self.client.take());
        if let Some(handle) = self.connection.take() {
            handle.await?;
        }
        Ok(())
    }
}
