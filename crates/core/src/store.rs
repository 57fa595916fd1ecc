//! The directory store contract.
//!
//! The core never talks to a database directly. Everything goes through
//! [`DirectoryStore`]: positional `?` placeholders, values as [`SqlValue`].

use std::fmt;

use serde::Serialize;

use crate::error::StoreError;

/// A single bound parameter or result cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

pub type Row = Vec<SqlValue>;

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Cell text as written to CSV exports and table views. `NULL` renders empty.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Parameterized access to the persisted record set.
///
/// One connection per implementation instance; callers never share a store
/// across concurrent operations.
pub trait DirectoryStore {
    /// Run a read query and return all rows.
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError>;

    /// Run a write statement and return the number of affected rows.
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, StoreError>;

    /// Column names of the most recent `query`.
    fn columns(&self) -> &[String];

    /// Release the connection. Later calls fail with [`StoreError::Closed`].
    fn close(&mut self) -> Result<(), StoreError>;

    /// Human-readable target (file path, DSN) for logs and status lines.
    fn describe(&self) -> String {
        "directory store".to_string()
    }
}
