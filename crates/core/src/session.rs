use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StoreError;
use crate::store::{DirectoryStore, Row};

/// Cached projection of the user table, as last shown to the operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordView {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl RecordView {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// The live authenticated connection. At most one exists per run.
pub struct Session {
    store: Box<dyn DirectoryStore>,
    opened_at: DateTime<Utc>,
    view: RecordView,
}

impl Session {
    pub fn new(store: Box<dyn DirectoryStore>) -> Self {
        Self {
            store,
            opened_at: Utc::now(),
            view: RecordView::default(),
        }
    }

    pub fn store(&mut self) -> &mut dyn DirectoryStore {
        self.store.as_mut()
    }

    pub fn target(&self) -> String {
        self.store.describe()
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn view(&self) -> &RecordView {
        &self.view
    }

    pub fn set_view(&mut self, view: RecordView) {
        self.view = view;
    }

    pub fn close(mut self) -> Result<(), StoreError> {
        log::info!("closing session on {}", self.store.describe());
        self.store.close()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.store.describe())
            .field("opened_at", &self.opened_at)
            .field("cached_rows", &self.view.len())
            .finish()
    }
}
