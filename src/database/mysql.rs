use super::{Column, Row, SqlSource};
use crate::config::ConnectionConfig;
use crate::dispatch::EngineKind;
use crate::sql::{quote_identifier, QuoteStyle, SqlValue};
use anyhow::anyhow;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column as _, Connection, Executor, Row as _, TypeInfo, ValueRef};
use std::ops::Deref;
use tracing::debug;

const NUMERIC_TYPES: &[&str] = &[
    "TINYINT", "SMALLINT", "MEDIUMINT", "INT", "BIGINT", "BOOLEAN", "FLOAT", "DOUBLE", "DECIMAL",
    "YEAR",
];

const BINARY_TYPES: &[&str] = &[
    "BINARY", "VARBINARY", "TINYBLOB", "BLOB", "MEDIUMBLOB", "LONGBLOB", "BIT",
];

/// Only these declared types take a `(length)` qualifier in a `CREATE TABLE`.
const SIZED_TYPES: &[&str] = &["char", "varchar", "binary", "varbinary"];

pub struct MySql {
    config: ConnectionConfig,
    database: String,
    conn: Option<MySqlConnection>,
}

impl Deref for MySql {
    type Target = ConnectionConfig;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

impl MySql {
    pub fn new(config: &ConnectionConfig, database: &str) -> Self {
        MySql {
            config: config.clone(),
            database: database.to_string(),
            conn: None,
        }
    }

    fn conn(&mut self) -> anyhow::Result<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| anyhow!("MySQL connection is not open"))
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port_for(EngineKind::RelationalA))
            .database(&self.database);
        if let Some(username) = &self.username {
            options = options.username(username);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        options
    }
}

#[async_trait::async_trait]
impl SqlSource for MySql {
    async fn open(&mut self) -> anyhow::Result<()> {
        let conn = MySqlConnection::connect_with(&self.connect_options()).await?;
        debug!("Connected to MySQL database {}", self.database);
        self.conn = Some(conn);
        Ok(())
    }

    async fn list_tables(&mut self, database: &str) -> anyhow::Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT CAST(TABLE_NAME AS CHAR) FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' \
             ORDER BY TABLE_NAME",
        )
        .bind(database)
        .fetch_all(self.conn()?)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn describe_columns(
        &mut self,
        database: &str,
        table: &str,
    ) -> anyhow::Result<Vec<Column>> {
        let rows: Vec<(String, String, Option<i64>, String, Option<String>)> = sqlx::query_as(
            "SELECT CAST(COLUMN_NAME AS CHAR), CAST(DATA_TYPE AS CHAR), \
             CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED), CAST(IS_NULLABLE AS CHAR), \
             CAST(COLUMN_DEFAULT AS CHAR) \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION",
        )
        .bind(database)
        .bind(table)
        .fetch_all(self.conn()?)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, length, nullable, default)| {
                let sized = SIZED_TYPES.contains(&data_type.to_ascii_lowercase().as_str());
                Column {
                    name,
                    data_type,
                    length: if sized { length } else { None },
                    nullable: nullable.eq_ignore_ascii_case("YES"),
                    default,
                }
            })
            .collect())
    }

    async fn show_create(&mut self, table: &str) -> anyhow::Result<Option<String>> {
        let sql = format!(
            "SHOW CREATE TABLE {}",
            quote_identifier(table, QuoteStyle::Backtick)
        );
        let row = self.conn()?.fetch_optional(sqlx::raw_sql(&sql)).await?;

        match row {
            Some(row) => {
                // 第二列是 `Create Table`
                let text: Vec<u8> = row.try_get_unchecked(1)?;
                Ok(Some(String::from_utf8_lossy(&text).into_owned()))
            }
            None => Ok(None),
        }
    }

    async fn fetch_rows(&mut self, table: &str) -> anyhow::Result<Vec<Row>> {
        let sql = format!(
            "SELECT * FROM {}",
            quote_identifier(table, QuoteStyle::Backtick)
        );
        // raw_sql 走文本协议，数值列以十进制文本返回，不会丢精度
        let rows = self.conn()?.fetch_all(sqlx::raw_sql(&sql)).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }
}

fn decode_row(row: &MySqlRow) -> anyhow::Result<Row> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for column in row.columns() {
        let index = column.ordinal();
        columns.push(column.name().to_string());

        if row.try_get_raw(index)?.is_null() {
            values.push(SqlValue::Null);
            continue;
        }
        let bytes: Vec<u8> = row.try_get_unchecked(index)?;
        values.push(classify_value(column.type_info().name(), bytes));
    }

    Ok(Row { columns, values })
}

fn base_type(type_name: &str) -> &str {
    type_name
        .split_whitespace()
        .next()
        .unwrap_or(type_name)
}

pub(crate) fn classify_value(type_name: &str, bytes: Vec<u8>) -> SqlValue {
    let base = base_type(type_name);
    if NUMERIC_TYPES.contains(&base) {
        SqlValue::Number(String::from_utf8_lossy(&bytes).into_owned())
    } else if BINARY_TYPES.contains(&base) {
        SqlValue::Bytes(bytes)
    } else {
        match String::from_utf8(bytes) {
            Ok(text) => SqlValue::Text(text),
            Err(e) => SqlValue::Bytes(e.into_bytes()),
        }
    }
}
