pub mod literal;

pub use literal::{format_literal, quote_identifier, QuoteStyle, SqlValue};
