//! Column values produced by row generators.

use sqlx::query_builder::Separated;
use sqlx::Postgres;
use time::{Date, OffsetDateTime};

/// Primary/foreign key values as read back from the database.
pub type Id = i64;

/// A single bindable column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i32),
    BigInt(i64),
    Text(String),
    Bool(bool),
    Date(Date),
    Timestamp(OffsetDateTime),
}

impl SqlValue {
    /// Binds this value as the next element of a `VALUES` tuple.
    pub fn push_bind_to<'args>(&self, row: &mut Separated<'_, 'args, Postgres, &'static str>) {
        match self {
            SqlValue::Int(v) => row.push_bind(*v),
            SqlValue::BigInt(v) => row.push_bind(*v),
            SqlValue::Text(v) => row.push_bind(v.clone()),
            SqlValue::Bool(v) => row.push_bind(*v),
            SqlValue::Date(v) => row.push_bind(*v),
            SqlValue::Timestamp(v) => row.push_bind(*v),
        };
    }

    pub fn as_id(&self) -> Option<Id> {
        match self {
            SqlValue::Int(v) => Some(i64::from(*v)),
            SqlValue::BigInt(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<Date> for SqlValue {
    fn from(v: Date) -> Self {
        SqlValue::Date(v)
    }
}

impl From<OffsetDateTime> for SqlValue {
    fn from(v: OffsetDateTime) -> Self {
        SqlValue::Timestamp(v)
    }
}

/// Builds a row of [`SqlValue`]s from heterogeneous expressions.
///
/// ```ignore
/// let row = row![name, 42, true];
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::db::SqlValue::from($value)),*]
    };
}

/// Quotes a Postgres identifier, doubling any embedded quote.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
