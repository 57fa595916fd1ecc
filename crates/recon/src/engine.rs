use std::path::Path;

use myadmin_core::directory::{
    find_id_by_username, insert_record, modified_stamp, org_unit_exists, refresh_view,
    update_record,
};
use myadmin_core::{ContactFields, DirectoryRecord, DirectoryStore, Session, UserStatus};
use myadmin_io::csv::{read_file_as_utf8, sniff_delimiter};

use crate::config::{ColumnMapping, ImportConfig};
use crate::derived::{derive_email, derive_username};
use crate::error::ReconError;
use crate::model::{FailureKind, ImportRecord, ReconciliationOutcome, RowFailure};

/// Import a bulk file into the session's store.
///
/// The session is checked before the file is touched. The cached record view
/// is refreshed once all rows have been processed.
pub fn import_file(
    path: &Path,
    session: Option<&mut Session>,
    config: &ImportConfig,
) -> Result<ReconciliationOutcome, ReconError> {
    let session = session.ok_or(ReconError::NoActiveSession)?;
    let content =
        read_file_as_utf8(path).map_err(|e| ReconError::Io(format!("{}: {e}", path.display())))?;

    log::info!("importing {}", path.display());
    let outcome = reconcile(&content, session.store(), config)?;
    log::info!("import of {} finished: {outcome}", path.display());

    // Rows are already committed; a stale view is not worth failing the import over
    if let Err(e) = refresh_view(session) {
        log::warn!("record view not refreshed after import: {e}");
    }
    Ok(outcome)
}

/// Apply every row of `content` to `store`, in file order.
pub fn reconcile(
    content: &str,
    store: &mut dyn DirectoryStore,
    config: &ImportConfig,
) -> Result<ReconciliationOutcome, ReconError> {
    let records = load_import_rows(content, &config.columns)?;
    let mut outcome = ReconciliationOutcome::default();

    for row in &records {
        match apply_row(row, store, config) {
            Ok(RowAction::Inserted) => outcome.inserted += 1,
            Ok(RowAction::Updated) => outcome.updated += 1,
            Err(failure) => {
                log::warn!("import row skipped: {failure}");
                outcome.failures.push(failure);
            }
        }
    }

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the bulk file into trimmed rows. A missing required column rejects
/// the whole file; missing optional columns read as empty.
pub fn load_import_rows(content: &str, columns: &ColumnMapping) -> Result<Vec<ImportRecord>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(sniff_delimiter(content))
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx = |name: &str| headers.iter().position(|h| h == name);
    let mut found = [0usize; 4];
    for (slot, name) in found.iter_mut().zip(columns.required()) {
        *slot = idx(name).ok_or_else(|| ReconError::MissingColumn { column: name.into() })?;
    }
    let [firstname_idx, lastname_idx, org_unit_idx, status_idx] = found;

    let phone_idx = idx(&columns.phone);
    let department_idx = idx(&columns.department);
    let street_idx = idx(&columns.street);
    let city_idx = idx(&columns.city);
    let city_code_idx = idx(&columns.city_code);
    let postalcode_idx = idx(&columns.postalcode);

    let mut rows = Vec::new();

    for (n, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ReconError::Csv(e.to_string()))?;

        // Fully blank lines (trailing newlines from spreadsheet exports)
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        let optional = |i: Option<usize>| i.map(field).unwrap_or_default();

        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(n as u64 + 2);

        rows.push(ImportRecord {
            line,
            firstname: field(firstname_idx),
            lastname: field(lastname_idx),
            org_unit: field(org_unit_idx),
            status: field(status_idx),
            contact: ContactFields {
                phone: optional(phone_idx),
                department: optional(department_idx),
                street: optional(street_idx),
                city: optional(city_idx),
                city_code: optional(city_code_idx),
                postalcode: optional(postalcode_idx),
            },
        });
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Per-row processing
// ---------------------------------------------------------------------------

enum RowAction {
    Inserted,
    Updated,
}

/// Turn a parsed row into a directory record, deriving username and email.
pub fn to_directory_record(
    row: &ImportRecord,
    columns: &ColumnMapping,
    email_domain: &str,
) -> Result<DirectoryRecord, String> {
    if row.firstname.is_empty() {
        return Err(format!("'{}' is empty", columns.firstname));
    }
    if row.lastname.is_empty() {
        return Err(format!("'{}' is empty", columns.lastname));
    }
    let org_unit = parse_code(&row.org_unit, &columns.org_unit)?;
    let status = parse_code(&row.status, &columns.status)?;
    if UserStatus::from_code(status).is_none() {
        return Err(format!("'{}' has unknown status code {status}", columns.status));
    }

    Ok(DirectoryRecord {
        username: derive_username(&row.firstname, &row.lastname),
        firstname: row.firstname.clone(),
        lastname: row.lastname.clone(),
        email: derive_email(&row.firstname, &row.lastname, email_domain),
        contact: row.contact.clone(),
        status,
        org_unit,
    })
}

fn parse_code(value: &str, column: &str) -> Result<i64, String> {
    if value.is_empty() {
        return Err(format!("'{column}' is empty"));
    }
    value
        .parse::<i64>()
        .map_err(|_| format!("'{column}' value '{value}' is not a number"))
}

fn apply_row(
    row: &ImportRecord,
    store: &mut dyn DirectoryStore,
    config: &ImportConfig,
) -> Result<RowAction, RowFailure> {
    let record = to_directory_record(row, &config.columns, &config.email_domain).map_err(|message| {
        RowFailure {
            line: row.line,
            username: None,
            kind: FailureKind::Validation,
            message,
        }
    })?;

    let fail = |kind: FailureKind, message: String| RowFailure {
        line: row.line,
        username: Some(record.username.clone()),
        kind,
        message,
    };

    if config.validate_org_units {
        let known = org_unit_exists(store, record.org_unit)
            .map_err(|e| fail(FailureKind::Store, e.to_string()))?;
        if !known {
            return Err(fail(
                FailureKind::Validation,
                format!("org unit {} does not exist", record.org_unit),
            ));
        }
    }

    let existing = find_id_by_username(store, &record.username)
        .map_err(|e| fail(FailureKind::Store, e.to_string()))?;

    match existing {
        Some(id) => {
            update_record(store, &record, &modified_stamp())
                .map_err(|e| fail(FailureKind::Store, e.to_string()))?;
            log::debug!("line {}: updated {} (id {id})", row.line, record.username);
            Ok(RowAction::Updated)
        }
        None => {
            insert_record(store, &record).map_err(|e| fail(FailureKind::Store, e.to_string()))?;
            log::debug!("line {}: inserted {}", row.line, record.username);
            Ok(RowAction::Inserted)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
