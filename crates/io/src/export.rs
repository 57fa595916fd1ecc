// Export of the record view to CSV plus transfer to the durable location

use std::fmt;
use std::path::PathBuf;

use myadmin_core::directory::load_view;
use myadmin_core::error::StoreError;
use myadmin_core::Session;

use crate::csv::write_table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    /// No live session; nothing was read.
    SessionRequired,
    StoreRead(StoreError),
    Write { path: PathBuf, reason: String },
    /// The local file was written but could not be copied. It is left in place.
    Transfer { local: PathBuf, destination: PathBuf, reason: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionRequired => write!(f, "export requires an active session"),
            Self::StoreRead(e) => write!(f, "failed to read records: {e}"),
            Self::Write { path, reason } => {
                write!(f, "failed to write {}: {reason}", path.display())
            }
            Self::Transfer { local, destination, reason } => write!(
                f,
                "failed to copy {} to {}: {reason} (local file kept)",
                local.display(),
                destination.display()
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StoreRead(e) => Some(e),
            _ => None,
        }
    }
}

/// Writes the full user view to `local_path`, then copies it to `destination`.
#[derive(Debug, Clone)]
pub struct ExportWriter {
    local_path: PathBuf,
    destination: PathBuf,
}

impl ExportWriter {
    pub fn new(local_path: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
            destination: destination.into(),
        }
    }

    /// Returns the destination path on success.
    pub fn export_all(&self, session: Option<&mut Session>) -> Result<PathBuf, ExportError> {
        let session = session.ok_or(ExportError::SessionRequired)?;

        let view = load_view(session.store()).map_err(ExportError::StoreRead)?;
        log::debug!("exporting {} record(s)", view.len());

        write_table(&self.local_path, &view.columns, &view.rows).map_err(|reason| {
            ExportError::Write {
                path: self.local_path.clone(),
                reason,
            }
        })?;

        self.transfer()?;
        log::info!(
            "exported {} record(s) to {}",
            view.len(),
            self.destination.display()
        );
        Ok(self.destination.clone())
    }

    fn transfer(&self) -> Result<(), ExportError> {
        let fail = |reason: String| ExportError::Transfer {
            local: self.local_path.clone(),
            destination: self.destination.clone(),
            reason,
        };

        if let Some(parent) = self.destination.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
            }
        }
        // Copying a file onto itself truncates it first.
        if let (Ok(local), Ok(dest)) = (
            std::fs::canonicalize(&self.local_path),
            std::fs::canonicalize(&self.destination),
        ) {
            if local == dest {
                log::debug!("export destination is the local file, nothing to transfer");
                return Ok(());
            }
        }
        std::fs::copy(&self.local_path, &self.destination).map_err(|e| fail(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use myadmin_core::store::{DirectoryStore, Row, SqlValue};
    use tempfile::tempdir;

    /// Counts reads so tests can assert that none happened.
    struct CountingStore {
        reads: Rc<Cell<usize>>,
        columns: Vec<String>,
    }

    impl DirectoryStore for CountingStore {
        fn query(&mut self, _sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
            self.reads.set(self.reads.get() + 1);
            self.columns = vec!["id_pk".into(), "username".into(), "phone".into()];
            Ok(vec![vec![SqlValue::Integer(1), SqlValue::from("amuster"), SqlValue::Null]])
        }
        fn execute(&mut self, _sql: &str, _params: &[SqlValue]) -> Result<usize, StoreError> {
            Ok(0)
        }
        fn columns(&self) -> &[String] {
            &self.columns
        }
        fn close(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn session(reads: Rc<Cell<usize>>) -> Session {
        Session::new(Box::new(CountingStore { reads, columns: Vec::new() }))
    }

    #[test]
    fn export_without_session_reads_nothing() {
        let reads = Rc::new(Cell::new(0));
        let dir = tempdir().unwrap();
        let writer = ExportWriter::new(dir.path().join("local.csv"), dir.path().join("share/out.csv"));

        assert_eq!(writer.export_all(None), Err(ExportError::SessionRequired));
        assert_eq!(reads.get(), 0);
        assert!(!dir.path().join("local.csv").exists());
    }

    #[test]
    fn export_writes_local_and_destination() {
        let reads = Rc::new(Cell::new(0));
        let mut s = session(reads.clone());
        let dir = tempdir().unwrap();
        let local = dir.path().join("ad_export.csv");
        let dest = dir.path().join("share").join("logging").join("ad_export.csv");
        let writer = ExportWriter::new(&local, &dest);

        let out = writer.export_all(Some(&mut s)).unwrap();
        assert_eq!(out, dest);
        assert_eq!(reads.get(), 1);

        let expected = "id_pk,username,phone\n1,amuster,\n";
        assert_eq!(std::fs::read_to_string(&local).unwrap(), expected);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), expected);
    }

    #[test]
    fn export_onto_local_file_keeps_content() {
        let reads = Rc::new(Cell::new(0));
        let mut s = session(reads);
        let dir = tempdir().unwrap();
        let local = dir.path().join("ad_export.csv");
        // Same file reached through a different spelling
        let dest = dir.path().join("share").join("..").join("ad_export.csv");
        std::fs::create_dir(dir.path().join("share")).unwrap();
        let writer = ExportWriter::new(&local, &dest);

        writer.export_all(Some(&mut s)).unwrap();
        assert_eq!(std::fs::read_to_string(&local).unwrap(), "id_pk,username,phone\n1,amuster,\n");
    }

    #[test]
    fn failed_transfer_keeps_local_file() {
        let reads = Rc::new(Cell::new(0));
        let mut s = session(reads);
        let dir = tempdir().unwrap();
        let local = dir.path().join("ad_export.csv");
        // A regular file where the destination directory should be
        let blocker = dir.path().join("share");
        std::fs::write(&blocker, "not a directory").unwrap();
        let writer = ExportWriter::new(&local, blocker.join("ad_export.csv"));

        let err = writer.export_all(Some(&mut s)).unwrap_err();
        assert!(matches!(err, ExportError::Transfer { .. }), "got {err:?}");
        assert!(local.exists());
    }

    #[test]
    fn unwritable_local_path_is_write_error() {
        let reads = Rc::new(Cell::new(0));
        let mut s = session(reads);
        let dir = tempdir().unwrap();
        let writer = ExportWriter::new(dir.path().join("missing/dir/out.csv"), dir.path().join("dest.csv"));

        let err = writer.export_all(Some(&mut s)).unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
        assert!(!dir.path().join("dest.csv").exists());
    }
}
