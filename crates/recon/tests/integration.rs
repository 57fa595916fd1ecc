use std::path::PathBuf;

use myadmin_core::{Session, SqlValue};
use myadmin_io::SqliteStore;
use myadmin_recon::{import_file, FailureKind, ImportConfig, ReconError};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

fn new_session() -> Session {
    Session::new(Box::new(SqliteStore::open_in_memory().unwrap()))
}

/// `(username, email, status_id_fk, ou_id_fk, city)` for every user, by id.
fn users(session: &mut Session) -> Vec<(String, String, i64, i64, String)> {
    session
        .store()
        .query(
            "SELECT username, email, status_id_fk, ou_id_fk, city FROM aduser ORDER BY id_pk",
            &[],
        )
        .unwrap()
        .into_iter()
        .map(|r| {
            (
                r[0].to_string(),
                r[1].to_string(),
                r[2].as_i64().unwrap(),
                r[3].as_i64().unwrap(),
                r[4].to_string(),
            )
        })
        .collect()
}

// -------------------------------------------------------------------------
// Insert / update
// -------------------------------------------------------------------------

#[test]
fn first_import_inserts_every_row() {
    let mut session = new_session();
    let outcome = import_file(&fixture("students.csv"), Some(&mut session), &ImportConfig::default()).unwrap();

    assert_eq!(outcome.inserted, 3);
    assert_eq!(outcome.updated, 0);
    assert!(outcome.is_clean());

    let rows = users(&mut session);
    assert_eq!(rows[0].0, "amuster");
    assert_eq!(rows[0].1, "anna.muster@M-zukunftsmotor.local");
    assert_eq!(rows[2], ("ctest".into(), "cora.test@M-zukunftsmotor.local".into(), 2, 4, "Potsdam".into()));

    // View is refreshed after the import
    assert_eq!(session.view().len(), 3);
}

#[test]
fn reimport_is_idempotent() {
    let mut session = new_session();
    let config = ImportConfig::default();
    import_file(&fixture("students.csv"), Some(&mut session), &config).unwrap();
    let before = users(&mut session);

    let second = import_file(&fixture("students.csv"), Some(&mut session), &config).unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 3);
    assert_eq!(second.failed(), 0);
    assert_eq!(users(&mut session), before);
}

#[test]
fn update_stamps_modified() {
    let mut session = new_session();
    let config = ImportConfig::default();
    import_file(&fixture("students.csv"), Some(&mut session), &config).unwrap();

    let modified = |s: &mut Session| {
        s.store()
            .query("SELECT modified FROM aduser WHERE username = ?", &["amuster".into()])
            .unwrap()[0][0]
            .clone()
    };
    assert!(modified(&mut session).is_null());

    import_file(&fixture("students.csv"), Some(&mut session), &config).unwrap();
    assert!(!modified(&mut session).is_null());
}

#[test]
fn casing_does_not_create_a_second_record() {
    let mut session = new_session();
    let config = ImportConfig::default();
    import_file(&fixture("students.csv"), Some(&mut session), &config).unwrap();

    let outcome = import_file(&fixture("students_recased.csv"), Some(&mut session), &config).unwrap();
    assert_eq!((outcome.inserted, outcome.updated), (0, 1));

    let rows = users(&mut session);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], ("amuster".into(), "anna.muster@M-zukunftsmotor.local".into(), 2, 5, "Hamburg".into()));
}

// -------------------------------------------------------------------------
// Failures
// -------------------------------------------------------------------------

#[test]
fn one_bad_status_fails_only_that_row() {
    let mut session = new_session();
    let outcome = import_file(&fixture("students_bad_status.csv"), Some(&mut session), &ImportConfig::default()).unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.failed(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.line, 3);
    assert_eq!(failure.kind, FailureKind::Validation);
    assert!(failure.message.contains("aktiv"));

    let names: Vec<String> = users(&mut session).into_iter().map(|u| u.0).collect();
    assert_eq!(names, vec!["amuster", "ctest"]);
}

#[test]
fn missing_required_column_applies_nothing() {
    let mut session = new_session();
    let err = import_file(&fixture("students_missing_column.csv"), Some(&mut session), &ImportConfig::default()).unwrap_err();
    assert_eq!(err, ReconError::MissingColumn { column: "kurs".into() });
    assert!(users(&mut session).is_empty());
}

#[test]
fn missing_file_is_io_error() {
    let mut session = new_session();
    let err = import_file(&fixture("nope.csv"), Some(&mut session), &ImportConfig::default()).unwrap_err();
    assert!(matches!(err, ReconError::Io(_)));
}

#[test]
fn unknown_org_unit_rejected_when_validation_enabled() {
    let mut session = new_session();
    session
        .store()
        .execute("INSERT INTO ou (id_pk, name) VALUES (?, ?)", &[SqlValue::Integer(3), "FIAE 3".into()])
        .unwrap();

    let config = ImportConfig::default().with_org_unit_validation(true);
    let outcome = import_file(&fixture("students.csv"), Some(&mut session), &config).unwrap();

    // Cora is in course 4, which has no `ou` row
    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.failed(), 1);
    assert_eq!(outcome.failures[0].username.as_deref(), Some("ctest"));
    assert_eq!(outcome.failures[0].kind, FailureKind::Validation);
}

// -------------------------------------------------------------------------
// Input variants
// -------------------------------------------------------------------------

#[test]
fn excel_semicolon_windows_1252_file() {
    let mut session = new_session();
    let outcome = import_file(&fixture("students_excel.csv"), Some(&mut session), &ImportConfig::default()).unwrap();
    assert_eq!(outcome.inserted, 1);

    let rows = users(&mut session);
    assert_eq!(rows[0].0, "jmüller");
    assert_eq!(rows[0].1, "jürgen.müller@M-zukunftsmotor.local");
    assert_eq!(rows[0].4, "Köln");
}

#[test]
fn import_profile_maps_headers() {
    let profile = std::fs::read_to_string(fixture("course.import.toml")).unwrap();
    let config = ImportConfig::from_toml(&profile).unwrap();

    let mut session = new_session();
    let outcome = import_file(&fixture("students_course.csv"), Some(&mut session), &config).unwrap();
    assert_eq!(outcome.inserted, 1);

    let rows = users(&mut session);
    assert_eq!(rows[0].0, "ddoe");
    assert_eq!(rows[0].1, "dana.doe@schule.example");
    assert_eq!(rows[0].3, 7);
}

#[test]
fn outcome_serializes_for_json_output() {
    let mut session = new_session();
    let outcome = import_file(&fixture("students_bad_status.csv"), Some(&mut session), &ImportConfig::default()).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["inserted"], 2);
    assert_eq!(json["failures"][0]["kind"], "validation");
    assert_eq!(json["failures"][0]["line"], 3);
}
