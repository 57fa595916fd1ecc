//! Statements against the user table and the single-record operations
//! (edit, delete, deactivate) behind the Active Directory menu.

use chrono::Utc;

use crate::error::{DirectoryError, StoreError};
use crate::record::{DirectoryRecord, RecordKey, RecordPatch, UserStatus};
use crate::session::{RecordView, Session};
use crate::store::{DirectoryStore, SqlValue};

pub const USER_TABLE: &str = "aduser";
pub const DETAIL_VIEW: &str = "view_aduser_details";
pub const ORG_UNIT_TABLE: &str = "ou";

/// Timestamp written to `modified`, same layout as SQL `CURRENT_TIMESTAMP`.
pub fn modified_stamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

pub fn load_view(store: &mut dyn DirectoryStore) -> Result<RecordView, StoreError> {
    let rows = store.query(&format!("SELECT * FROM {DETAIL_VIEW}"), &[])?;
    Ok(RecordView {
        columns: store.columns().to_vec(),
        rows,
    })
}

pub fn refresh_view(session: &mut Session) -> Result<(), StoreError> {
    let view = load_view(session.store())?;
    log::debug!("record view refreshed: {} row(s)", view.len());
    session.set_view(view);
    Ok(())
}

/// Refresh after a committed change. The change stands even if the view
/// cannot be reloaded, so a failure here is only logged.
fn refresh_after(session: &mut Session, action: &str, key: &RecordKey) {
    if let Err(e) = refresh_view(session) {
        log::warn!("{action} record {key}, but the record view was not refreshed: {e}");
    }
}

// ---------------------------------------------------------------------------
// Upsert primitives
// ---------------------------------------------------------------------------

pub fn find_id_by_username(
    store: &mut dyn DirectoryStore,
    username: &str,
) -> Result<Option<i64>, StoreError> {
    let rows = store.query(
        &format!("SELECT id_pk FROM {USER_TABLE} WHERE username = ?"),
        &[SqlValue::from(username)],
    )?;
    Ok(rows.first().and_then(|r| r.first()).and_then(SqlValue::as_i64))
}

pub fn org_unit_exists(store: &mut dyn DirectoryStore, org_unit: i64) -> Result<bool, StoreError> {
    let rows = store.query(
        &format!("SELECT id_pk FROM {ORG_UNIT_TABLE} WHERE id_pk = ?"),
        &[SqlValue::Integer(org_unit)],
    )?;
    Ok(!rows.is_empty())
}

pub fn insert_record(store: &mut dyn DirectoryStore, record: &DirectoryRecord) -> Result<usize, StoreError> {
    let c = &record.contact;
    store.execute(
        &format!(
            "INSERT INTO {USER_TABLE} (firstname, lastname, username, email, phone, department, street, \
             city, city_code, postalcode, status_id_fk, ou_id_fk) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ),
        &[
            record.firstname.as_str().into(),
            record.lastname.as_str().into(),
            record.username.as_str().into(),
            record.email.as_str().into(),
            c.phone.as_str().into(),
            c.department.as_str().into(),
            c.street.as_str().into(),
            c.city.as_str().into(),
            c.city_code.as_str().into(),
            c.postalcode.as_str().into(),
            SqlValue::Integer(record.status),
            SqlValue::Integer(record.org_unit),
        ],
    )
}

/// Overwrite every mutable column of the record with this username.
/// `username` itself is the match key and never changes.
pub fn update_record(
    store: &mut dyn DirectoryStore,
    record: &DirectoryRecord,
    modified: &str,
) -> Result<usize, StoreError> {
    let c = &record.contact;
    store.execute(
        &format!(
            "UPDATE {USER_TABLE} SET firstname = ?, lastname = ?, email = ?, phone = ?, department = ?, \
             street = ?, city = ?, city_code = ?, postalcode = ?, status_id_fk = ?, ou_id_fk = ?, \
             modified = ? WHERE username = ?"
        ),
        &[
            record.firstname.as_str().into(),
            record.lastname.as_str().into(),
            record.email.as_str().into(),
            c.phone.as_str().into(),
            c.department.as_str().into(),
            c.street.as_str().into(),
            c.city.as_str().into(),
            c.city_code.as_str().into(),
            c.postalcode.as_str().into(),
            SqlValue::Integer(record.status),
            SqlValue::Integer(record.org_unit),
            modified.into(),
            record.username.as_str().into(),
        ],
    )
}

// ---------------------------------------------------------------------------
// Single-record operations
// ---------------------------------------------------------------------------

fn require_selection(key: Option<&RecordKey>) -> Result<&RecordKey, DirectoryError> {
    key.ok_or(DirectoryError::NoSelection)
}

/// Physically remove the selected record.
pub fn delete_record(session: &mut Session, key: Option<&RecordKey>) -> Result<(), DirectoryError> {
    let key = require_selection(key)?;
    let affected = session.store().execute(
        &format!("DELETE FROM {USER_TABLE} WHERE {} = ?", key.column()),
        &[key.value()],
    )?;
    if affected == 0 {
        return Err(DirectoryError::NotFound(key.to_string()));
    }
    log::info!("deleted record {key}");
    refresh_after(session, "deleted", key);
    Ok(())
}

/// Mark the selected record inactive. The row stays in the table.
pub fn deactivate_record(session: &mut Session, key: Option<&RecordKey>) -> Result<(), DirectoryError> {
    let key = require_selection(key)?;
    let affected = session.store().execute(
        &format!(
            "UPDATE {USER_TABLE} SET status_id_fk = ?, modified = ? WHERE {} = ?",
            key.column()
        ),
        &[
            SqlValue::Integer(UserStatus::Inactive.code()),
            modified_stamp().into(),
            key.value(),
        ],
    )?;
    if affected == 0 {
        return Err(DirectoryError::NotFound(key.to_string()));
    }
    log::info!("deactivated record {key}");
    refresh_after(session, "deactivated", key);
    Ok(())
}

/// Apply field changes to the selected record.
pub fn edit_record(
    session: &mut Session,
    key: Option<&RecordKey>,
    patch: &RecordPatch,
) -> Result<(), DirectoryError> {
    let key = require_selection(key)?;
    let assignments = patch.assignments();
    if assignments.is_empty() {
        return Err(DirectoryError::Validation("no fields to change".into()));
    }

    let set_clause: Vec<String> = assignments.iter().map(|(col, _)| format!("{col} = ?")).collect();
    let mut params: Vec<SqlValue> = assignments.into_iter().map(|(_, v)| v).collect();
    params.push(modified_stamp().into());
    params.push(key.value());

    let affected = session.store().execute(
        &format!(
            "UPDATE {USER_TABLE} SET {}, modified = ? WHERE {} = ?",
            set_clause.join(", "),
            key.column()
        ),
        &params,
    )?;
    if affected == 0 {
        return Err(DirectoryError::NotFound(key.to_string()));
    }
    log::info!("edited record {key}");
    refresh_after(session, "edited", key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Row;

    /// Records every statement; answers queries from a fixed script.
    #[derive(Default)]
    struct ScriptedStore {
        executed: Vec<(String, Vec<SqlValue>)>,
        affected: usize,
        columns: Vec<String>,
        view_fails: bool,
    }

    impl DirectoryStore for ScriptedStore {
        fn query(&mut self, sql: &str, _params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
            self.columns = vec!["id_pk".into()];
            if sql.contains(DETAIL_VIEW) {
                if self.view_fails {
                    return Err(StoreError::Query("no such table: view_aduser_details".into()));
                }
                return Ok(vec![vec![SqlValue::Integer(1)]]);
            }
            Ok(Vec::new())
        }
        fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, StoreError> {
            self.executed.push((sql.to_string(), params.to_vec()));
            Ok(self.affected)
        }
        fn columns(&self) -> &[String] {
            &self.columns
        }
        fn close(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn session(affected: usize) -> Session {
        Session::new(Box::new(ScriptedStore { affected, ..Default::default() }))
    }

    #[test]
    fn delete_requires_selection() {
        let mut s = session(1);
        assert_eq!(delete_record(&mut s, None), Err(DirectoryError::NoSelection));
        assert!(s.view().is_empty());
    }

    #[test]
    fn delete_refreshes_view() {
        let mut s = session(1);
        delete_record(&mut s, Some(&RecordKey::Id(7))).unwrap();
        assert_eq!(s.view().len(), 1);
        assert_eq!(s.view().columns, vec!["id_pk".to_string()]);
    }

    #[test]
    fn committed_change_survives_failed_refresh() {
        let store = ScriptedStore { affected: 1, view_fails: true, ..Default::default() };
        let mut s = Session::new(Box::new(store));

        delete_record(&mut s, Some(&RecordKey::Id(7))).unwrap();
        deactivate_record(&mut s, Some(&RecordKey::Username("amuster".into()))).unwrap();
        let patch = RecordPatch { city: Some("Potsdam".into()), ..Default::default() };
        edit_record(&mut s, Some(&RecordKey::Id(1)), &patch).unwrap();

        assert!(s.view().is_empty());
    }

    #[test]
    fn missing_record_is_not_found() {
        let mut s = session(0);
        let err = deactivate_record(&mut s, Some(&RecordKey::Username("nobody".into()))).unwrap_err();
        assert_eq!(err, DirectoryError::NotFound("username 'nobody'".into()));
    }

    #[test]
    fn empty_edit_is_rejected() {
        let mut s = session(1);
        let err = edit_record(&mut s, Some(&RecordKey::Id(1)), &RecordPatch::default()).unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
    }

    #[test]
    fn stamp_has_sql_layout() {
        let stamp = modified_stamp();
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[10..11], " ");
    }
}
