//! Handler table: binds every catalog command to the operation behind it.
//!
//! One-shot subcommands and the interactive shell both go through the router
//! built here, so a command behaves the same whichever way it is fired.

use std::fmt;
use std::path::PathBuf;

use myadmin_core::directory::{deactivate_record, delete_record, edit_record, refresh_view};
use myadmin_core::{
    CatalogError, CommandCatalog, CommandId, CommandRouter, DirectoryError, Handler, RecordKey,
    Session, StoreError,
};
use myadmin_io::{ExportError, ExportWriter, SqliteStore};
use myadmin_recon::{import_file, ImportConfig, ReconError, ReconciliationOutcome};

pub type Router = CommandRouter<Outcome, AppError>;

pub const APP_NAME: &str = "myAdmin";

pub const HELP_TEXT: &str = "\
myAdmin keeps the directory user table in sync with course lists.

  Log in          open the directory database (File > Log in)
  Import from CSV insert new users and update existing ones from a CSV file;
                  username and email are derived from first and last name
  Transfer to AD  export all users to CSV and copy the file to the transfer location
  Edit user       change fields of one user
  Delete AD user  remove one user permanently
  Deactivate      mark one user inactive; the record is kept
  Log out         close the database

Import files need the columns firstname, lastname, kurs and status_id_fk;
phone, abteilung, street, city, city_code and postalcode are optional.
";

/// What a handler produced, for the caller to render.
#[derive(Debug)]
pub enum Outcome {
    LoggedIn { target: String, records: usize },
    LoggedOut { was_active: bool },
    Imported(ReconciliationOutcome),
    Exported(PathBuf),
    Edited(RecordKey),
    Deleted(RecordKey),
    Deactivated(RecordKey),
    Text(String),
    Exit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoggedIn { target, records } => {
                write!(f, "logged in to {target} ({records} user(s))")
            }
            Self::LoggedOut { was_active: true } => write!(f, "logged out"),
            Self::LoggedOut { was_active: false } => write!(f, "not logged in"),
            Self::Imported(outcome) => write!(f, "import finished: {outcome}"),
            Self::Exported(path) => write!(f, "exported to {}", path.display()),
            Self::Edited(key) => write!(f, "updated {key}"),
            Self::Deleted(key) => write!(f, "deleted {key}"),
            Self::Deactivated(key) => write!(f, "deactivated {key}"),
            Self::Text(text) => write!(f, "{}", text.trim_end()),
            Self::Exit => write!(f, "bye"),
        }
    }
}

/// Any failure a handler can report.
#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed request arguments.
    Usage(String),
    Store(StoreError),
    Directory(DirectoryError),
    Import(ReconError),
    Export(ExportError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) => write!(f, "{msg}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::Directory(e) => write!(f, "{e}"),
            Self::Import(e) => write!(f, "import failed: {e}"),
            Self::Export(e) => write!(f, "transfer failed: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        Self::Directory(e)
    }
}

impl From<ReconError> for AppError {
    fn from(e: ReconError) -> Self {
        Self::Import(e)
    }
}

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Everything the handlers need from settings and flags.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// Used by login when the request carries no path.
    pub default_database: Option<PathBuf>,
    pub import: ImportConfig,
    pub export: ExportWriter,
}

/// Build the router and bind a handler to every command in `catalog`.
pub fn build_router(catalog: &CommandCatalog, ctx: AppContext) -> Result<Router, CatalogError> {
    let mut router = Router::new();

    let default_database = ctx.default_database.clone();
    router.register(
        CommandId::LOGIN,
        Handler::lifecycle(move |slot, request| {
            let path = request
                .path
                .clone()
                .or_else(|| default_database.clone())
                .ok_or_else(|| {
                    AppError::Usage("no database given; pass a path or set store.database".into())
                })?;

            let store = SqliteStore::open(&path)?;
            if let Some(previous) = slot.take() {
                if let Err(e) = previous.close() {
                    tracing::warn!("closing previous session failed: {e}");
                }
            }

            let mut session = Session::new(Box::new(store));
            refresh_view(&mut session)?;
            let outcome = Outcome::LoggedIn {
                target: session.target(),
                records: session.view().len(),
            };
            *slot = Some(session);
            Ok(outcome)
        }),
    )?;

    router.register(
        CommandId::LOGOUT,
        Handler::lifecycle(|slot, _| {
            let was_active = match slot.take() {
                Some(session) => {
                    session.close()?;
                    true
                }
                None => false,
            };
            Ok(Outcome::LoggedOut { was_active })
        }),
    )?;

    router.register(
        CommandId::EXIT,
        Handler::lifecycle(|slot, _| {
            if let Some(session) = slot.take() {
                if let Err(e) = session.close() {
                    tracing::warn!("closing session on exit failed: {e}");
                }
            }
            Ok(Outcome::Exit)
        }),
    )?;

    let import_config = ctx.import.clone();
    router.register(
        CommandId::IMPORT,
        Handler::session(move |session, request| {
            let path = request
                .path
                .as_deref()
                .ok_or_else(|| AppError::Usage("import needs a CSV file".into()))?;
            let outcome = import_file(path, Some(session), &import_config)?;
            Ok(Outcome::Imported(outcome))
        }),
    )?;

    let export = ctx.export.clone();
    router.register(
        CommandId::EXPORT,
        Handler::session(move |session, _| {
            let destination = export.export_all(Some(session))?;
            Ok(Outcome::Exported(destination))
        }),
    )?;

    router.register(
        CommandId::EDIT,
        Handler::session(|session, request| {
            edit_record(session, request.selection.as_ref(), &request.patch)?;
            Ok(Outcome::Edited(selected(request.selection.as_ref())?))
        }),
    )?;

    router.register(
        CommandId::DELETE,
        Handler::session(|session, request| {
            delete_record(session, request.selection.as_ref())?;
            Ok(Outcome::Deleted(selected(request.selection.as_ref())?))
        }),
    )?;

    router.register(
        CommandId::DEACTIVATE,
        Handler::session(|session, request| {
            deactivate_record(session, request.selection.as_ref())?;
            Ok(Outcome::Deactivated(selected(request.selection.as_ref())?))
        }),
    )?;

    router.register(
        CommandId::ABOUT,
        Handler::plain(|_| {
            Ok(Outcome::Text(format!(
                "{APP_NAME} {} ({})\nDirectory user administration",
                env!("CARGO_PKG_VERSION"),
                env!("MYADMIN_COMMIT")
            )))
        }),
    )?;

    router.register(
        CommandId::HELP,
        Handler::plain(|_| Ok(Outcome::Text(HELP_TEXT.to_string()))),
    )?;

    // Every menu and toolbar entry must lead somewhere
    for command in catalog.commands() {
        if !router.is_registered(command.id) {
            return Err(CatalogError::UnknownId(command.id));
        }
    }

    Ok(router)
}

fn selected(key: Option<&RecordKey>) -> Result<RecordKey, AppError> {
    key.cloned().ok_or(AppError::Directory(DirectoryError::NoSelection))
}
