use std::fmt;

use crate::command::CommandId;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Two actions in one catalog share an identifier.
    DuplicateId(CommandId),
    /// Identifier 0 is reserved for separators.
    ReservedSeparator,
    /// An action was declared in a group other than `id / 10`.
    GroupMismatch { id: CommandId, declared: u16, derived: u16 },
    /// An entry was placed in a group with no menu declared for it.
    UnknownGroup(u16),
    /// A toolbar or lookup referenced an id the catalog does not define.
    UnknownId(CommandId),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "duplicate command id {id}"),
            Self::ReservedSeparator => write!(f, "command id 0 is reserved for separators"),
            Self::GroupMismatch { id, declared, derived } => {
                write!(f, "command {id} declared in group {declared}, but its id places it in group {derived}")
            }
            Self::UnknownGroup(group) => write!(f, "no menu group {group} is declared"),
            Self::UnknownId(id) => write!(f, "command id {id} is not in the catalog"),
        }
    }
}

impl std::error::Error for CatalogError {}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Failure of [`CommandRouter::dispatch`](crate::router::CommandRouter::dispatch).
///
/// Handler failures are carried in `Handler` exactly as the handler returned them.
#[derive(Debug)]
pub enum DispatchError<E> {
    UnknownCommand(CommandId),
    NoActiveSession(CommandId),
    Handler(E),
}

impl<E: fmt::Display> fmt::Display for DispatchError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(id) => write!(f, "unknown command {id}"),
            Self::NoActiveSession(id) => write!(f, "command {id} requires an active session; log in first"),
            Self::Handler(e) => write!(f, "{e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for DispatchError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Handler(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connection could not be opened.
    Open { target: String, reason: String },
    /// Query or statement failed.
    Query(String),
    /// Constraint violation (unique username, not-null column, ...).
    Constraint(String),
    /// The connection was already closed.
    Closed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { target, reason } => write!(f, "cannot open store '{target}': {reason}"),
            Self::Query(msg) => write!(f, "query failed: {msg}"),
            Self::Constraint(msg) => write!(f, "constraint violated: {msg}"),
            Self::Closed => write!(f, "store connection is closed"),
        }
    }
}

impl std::error::Error for StoreError {}

// ---------------------------------------------------------------------------
// Single-record operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// No record was selected for a single-record operation.
    NoSelection,
    /// The selected key matches no record.
    NotFound(String),
    /// The requested change is malformed (e.g. an empty edit).
    Validation(String),
    Store(StoreError),
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSelection => write!(f, "no record selected"),
            Self::NotFound(key) => write!(f, "no record matches {key}"),
            Self::Validation(msg) => write!(f, "invalid change: {msg}"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DirectoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for DirectoryError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
