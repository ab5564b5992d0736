//! SQL text helpers shared by the relational dumpers.
//!
//! Both functions here are pure: the same input always produces the same text,
//! and neither can fail.

/// A scalar read from a relational row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    /// Decimal text exactly as the engine produced it.
    Number(String),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Number(value.to_string())
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        SqlValue::Number(value.to_string())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        // NaN/inf 没有数字字面量
        if value.is_finite() {
            SqlValue::Number(value.to_string())
        } else {
            SqlValue::Text(value.to_string())
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Render a value as a literal usable in an `INSERT ... VALUES` tuple.
pub fn format_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Number(text) => text.clone(),
        SqlValue::Text(text) => quote_string(text),
        SqlValue::Bytes(bytes) => quote_string(&String::from_utf8_lossy(bytes)),
    }
}

fn quote_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// MySQL: `name`
    Backtick,
    /// PostgreSQL / ANSI: "name"
    DoubleQuote,
}

pub fn quote_identifier(name: &str, style: QuoteStyle) -> String {
    let quote = match style {
        QuoteStyle::Backtick => '`',
        QuoteStyle::DoubleQuote => '"',
    };
    let mut out = String::with_capacity(name.len() + 2);
    out.push(quote);
    for ch in name.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
    out
}
