use std::fmt;

use serde::Serialize;

use myadmin_core::ContactFields;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One row of the bulk file, fields trimmed but not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRecord {
    /// 1-based line in the source file (the header is line 1).
    pub line: u64,
    pub firstname: String,
    pub lastname: String,
    pub org_unit: String,
    pub status: String,
    pub contact: ContactFields,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Row content was rejected; no store call was made for it.
    Validation,
    /// The store refused the lookup or write for this row.
    Store,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Store => write!(f, "store"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub line: u64,
    /// Set once the row got far enough to derive one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)?;
        if let Some(ref username) = self.username {
            write!(f, " ({username})")?;
        }
        write!(f, ": {} error: {}", self.kind, self.message)
    }
}

/// Summary of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationOutcome {
    pub inserted: usize,
    pub updated: usize,
    pub failures: Vec<RowFailure>,
}

impl ReconciliationOutcome {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} failed",
            self.inserted,
            self.updated,
            self.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_summary_line() {
        let outcome = ReconciliationOutcome {
            inserted: 2,
            updated: 1,
            failures: vec![RowFailure {
                line: 4,
                username: None,
                kind: FailureKind::Validation,
                message: "status_id_fk 'x' is not a number".into(),
            }],
        };
        assert_eq!(outcome.to_string(), "2 inserted, 1 updated, 1 failed");
        assert!(!outcome.is_clean());
    }

    #[test]
    fn failure_display_includes_username_when_known() {
        let failure = RowFailure {
            line: 3,
            username: Some("amuster".into()),
            kind: FailureKind::Store,
            message: "database is locked".into(),
        };
        assert_eq!(failure.to_string(), "line 3 (amuster): store error: database is locked");
    }
}
