//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, missing file, invalid edit)   |
//! | 3    | Unknown command id                                   |
//! | 4    | Command needs an active session                      |
//! | 5    | Command needs a selected record                      |
//! | 6    | Import finished but some rows failed                 |
//! | 7    | Store error (open, query, constraint)                |
//! | 8    | Transfer failed (local export file kept)             |
//! | 9    | Selected record does not exist                       |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `app_exit_code` / `dispatch_exit_code`

use myadmin_core::{DirectoryError, DispatchError};
use myadmin_io::ExportError;
use myadmin_recon::ReconError;

use crate::handlers::AppError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// No handler is registered for the fired id.
pub const EXIT_UNKNOWN_COMMAND: u8 = 3;

/// Session-gated command fired while logged out.
pub const EXIT_NO_SESSION: u8 = 4;

/// Single-record command fired without a selected record.
pub const EXIT_NO_SELECTION: u8 = 5;

/// Import completed, but at least one row was skipped.
pub const EXIT_PARTIAL_IMPORT: u8 = 6;

/// Store could not be opened, or a statement failed.
pub const EXIT_STORE: u8 = 7;

/// Export file written locally but not copied to its destination.
pub const EXIT_TRANSFER: u8 = 8;

/// The selected key matched no record.
pub const EXIT_NOT_FOUND: u8 = 9;

/// Map a handler failure to its exit code.
pub fn app_exit_code(err: &AppError) -> u8 {
    match err {
        AppError::Usage(_) => EXIT_USAGE,
        AppError::Store(_) => EXIT_STORE,
        AppError::Directory(e) => match e {
            DirectoryError::NoSelection => EXIT_NO_SELECTION,
            DirectoryError::NotFound(_) => EXIT_NOT_FOUND,
            DirectoryError::Validation(_) => EXIT_USAGE,
            DirectoryError::Store(_) => EXIT_STORE,
        },
        AppError::Import(e) => match e {
            ReconError::NoActiveSession => EXIT_NO_SESSION,
            ReconError::Io(_) => EXIT_USAGE,
            ReconError::Store(_) => EXIT_STORE,
            ReconError::MissingColumn { .. }
            | ReconError::Csv(_)
            | ReconError::ConfigParse(_)
            | ReconError::ConfigValidation(_) => EXIT_ERROR,
        },
        AppError::Export(e) => match e {
            ExportError::SessionRequired => EXIT_NO_SESSION,
            ExportError::StoreRead(_) => EXIT_STORE,
            ExportError::Write { .. } => EXIT_ERROR,
            ExportError::Transfer { .. } => EXIT_TRANSFER,
        },
    }
}

/// Map a router failure to its exit code.
pub fn dispatch_exit_code(err: &DispatchError<AppError>) -> u8 {
    match err {
        DispatchError::UnknownCommand(_) => EXIT_UNKNOWN_COMMAND,
        DispatchError::NoActiveSession(_) => EXIT_NO_SESSION,
        DispatchError::Handler(e) => app_exit_code(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myadmin_core::{CommandId, StoreError};
    use std::path::PathBuf;

    #[test]
    fn precondition_codes() {
        assert_eq!(dispatch_exit_code(&DispatchError::UnknownCommand(CommandId(77))), EXIT_UNKNOWN_COMMAND);
        assert_eq!(dispatch_exit_code(&DispatchError::NoActiveSession(CommandId::IMPORT)), EXIT_NO_SESSION);
        assert_eq!(
            dispatch_exit_code(&DispatchError::Handler(AppError::Directory(DirectoryError::NoSelection))),
            EXIT_NO_SELECTION
        );
    }

    #[test]
    fn transfer_and_store_codes() {
        let transfer = AppError::Export(ExportError::Transfer {
            local: PathBuf::from("ad_export.csv"),
            destination: PathBuf::from("/share/ad_export.csv"),
            reason: "permission denied".into(),
        });
        assert_eq!(app_exit_code(&transfer), EXIT_TRANSFER);
        assert_eq!(app_exit_code(&AppError::Store(StoreError::Closed)), EXIT_STORE);
        assert_eq!(
            app_exit_code(&AppError::Directory(DirectoryError::NotFound("id 4".into()))),
            EXIT_NOT_FOUND
        );
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_UNKNOWN_COMMAND,
            EXIT_NO_SESSION,
            EXIT_NO_SELECTION,
            EXIT_PARTIAL_IMPORT,
            EXIT_STORE,
            EXIT_TRANSFER,
            EXIT_NOT_FOUND,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
