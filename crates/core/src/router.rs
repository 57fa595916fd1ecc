//! Command router: fired identifier in, handler result out.
//!
//! The router owns the handler table and the live session slot and nothing
//! else. Session gating is decided by the handler's shape: a
//! [`Handler::Session`] never runs without a session.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::command::CommandId;
use crate::error::{CatalogError, DispatchError};
use crate::record::{RecordKey, RecordPatch};
use crate::session::Session;

/// Arguments gathered by the UI layer for one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandRequest {
    /// File chosen by the operator (import source, database to log in to).
    pub path: Option<PathBuf>,
    /// The single selected record, if any.
    pub selection: Option<RecordKey>,
    /// Field changes for the edit command.
    pub patch: RecordPatch,
}

impl CommandRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_selection(mut self, key: RecordKey) -> Self {
        self.selection = Some(key);
        self
    }

    pub fn with_patch(mut self, patch: RecordPatch) -> Self {
        self.patch = patch;
        self
    }
}

type PlainFn<O, E> = dyn FnMut(&CommandRequest) -> Result<O, E>;
type SessionFn<O, E> = dyn FnMut(&mut Session, &CommandRequest) -> Result<O, E>;
type LifecycleFn<O, E> = dyn FnMut(&mut Option<Session>, &CommandRequest) -> Result<O, E>;

pub enum Handler<O, E> {
    /// Needs no session (about, help, exit).
    Plain(Box<PlainFn<O, E>>),
    /// Requires an active session; rejected with `NoActiveSession` otherwise.
    Session(Box<SessionFn<O, E>>),
    /// Opens or closes the session itself (login, logout).
    Lifecycle(Box<LifecycleFn<O, E>>),
}

impl<O, E> Handler<O, E> {
    pub fn plain(f: impl FnMut(&CommandRequest) -> Result<O, E> + 'static) -> Self {
        Self::Plain(Box::new(f))
    }

    pub fn session(f: impl FnMut(&mut Session, &CommandRequest) -> Result<O, E> + 'static) -> Self {
        Self::Session(Box::new(f))
    }

    pub fn lifecycle(
        f: impl FnMut(&mut Option<Session>, &CommandRequest) -> Result<O, E> + 'static,
    ) -> Self {
        Self::Lifecycle(Box::new(f))
    }

    pub fn requires_session(&self) -> bool {
        matches!(self, Self::Session(_))
    }
}

pub struct CommandRouter<O, E> {
    handlers: HashMap<CommandId, Handler<O, E>>,
    session: Option<Session>,
}

impl<O, E> Default for CommandRouter<O, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O, E> CommandRouter<O, E> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            session: None,
        }
    }

    /// Bind a handler to an id. A later registration for the same id replaces
    /// the earlier one; id 0 is rejected.
    pub fn register(&mut self, id: CommandId, handler: Handler<O, E>) -> Result<(), CatalogError> {
        if id.is_separator() {
            return Err(CatalogError::ReservedSeparator);
        }
        if self.handlers.insert(id, handler).is_some() {
            log::debug!("handler for command {id} replaced");
        }
        Ok(())
    }

    pub fn is_registered(&self, id: CommandId) -> bool {
        self.handlers.contains_key(&id)
    }

    pub fn requires_session(&self, id: CommandId) -> Option<bool> {
        self.handlers.get(&id).map(Handler::requires_session)
    }

    /// Run the handler bound to `id` synchronously.
    pub fn dispatch(&mut self, id: CommandId, request: &CommandRequest) -> Result<O, DispatchError<E>> {
        let handler = self
            .handlers
            .get_mut(&id)
            .ok_or(DispatchError::UnknownCommand(id))?;

        log::debug!("dispatching command {id}");
        match handler {
            Handler::Plain(f) => f(request).map_err(DispatchError::Handler),
            Handler::Session(f) => {
                let session = self.session.as_mut().ok_or(DispatchError::NoActiveSession(id))?;
                f(session, request).map_err(DispatchError::Handler)
            }
            Handler::Lifecycle(f) => f(&mut self.session, request).map_err(DispatchError::Handler),
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Close the live session, if any. Used on application exit.
    pub fn close_session(&mut self) -> Result<(), crate::error::StoreError> {
        match self.session.take() {
            Some(session) => session.close(),
            None => Ok(()),
        }
    }
}
