//! `myadmin-recon`: bulk import engine.
//!
//! Reads a CSV of people, derives username and email for each row, and
//! inserts or updates the matching directory record. Row-level problems are
//! collected into the outcome; only file-level problems abort the run.

pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod model;

pub use config::{ColumnMapping, ImportConfig};
pub use engine::{import_file, reconcile};
pub use error::ReconError;
pub use model::{FailureKind, ImportRecord, ReconciliationOutcome, RowFailure};
