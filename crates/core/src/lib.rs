//! `myadmin-core`: command catalog, dispatch, and the directory record model.
//!
//! Everything here is storage-agnostic: the store is consumed through the
//! [`DirectoryStore`] trait, so the catalog, router and single-record
//! operations can be exercised against any implementation.

pub mod command;
pub mod directory;
pub mod error;
pub mod record;
pub mod router;
pub mod session;
pub mod store;

pub use command::{Command, CommandCatalog, CommandId, CommandKind, MenuGroup, ToolbarItem};
pub use error::{CatalogError, DirectoryError, DispatchError, StoreError};
pub use record::{ContactFields, DirectoryRecord, RecordKey, RecordPatch, UserStatus};
pub use router::{CommandRequest, CommandRouter, Handler};
pub use session::{RecordView, Session};
pub use store::{DirectoryStore, Row, SqlValue};
