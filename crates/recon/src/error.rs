use std::fmt;

use myadmin_core::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// Import was requested while logged out. Nothing was read.
    NoActiveSession,
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Import profile validation error (empty domain, blank column name, ...).
    ConfigValidation(String),
    /// Header lacks a required column. No row was applied.
    MissingColumn { column: String },
    /// Malformed CSV structure.
    Csv(String),
    /// IO error (file read, etc.).
    Io(String),
    /// Store failure outside of per-row processing.
    Store(StoreError),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveSession => write!(f, "import requires an active session"),
            Self::ConfigParse(msg) => write!(f, "import profile parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "import profile validation error: {msg}"),
            Self::MissingColumn { column } => write!(f, "missing required column '{column}'"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ReconError {}

impl From<StoreError> for ReconError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
