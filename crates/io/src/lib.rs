// File and store I/O

pub mod csv;
pub mod export;
pub mod sqlite;

pub use export::{ExportError, ExportWriter};
pub use sqlite::SqliteStore;
