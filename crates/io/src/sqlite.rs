// SQLite-backed directory store

use std::path::Path;

use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode};

use myadmin_core::error::StoreError;
use myadmin_core::store::{DirectoryStore, Row, SqlValue};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS status (
    id_pk INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

INSERT OR IGNORE INTO status (id_pk, name) VALUES (1, 'active'), (2, 'inactive');

CREATE TABLE IF NOT EXISTS ou (
    id_pk INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS aduser (
    id_pk INTEGER PRIMARY KEY AUTOINCREMENT,
    firstname TEXT NOT NULL,
    lastname TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    phone TEXT,
    department TEXT,
    street TEXT,
    city TEXT,
    city_code TEXT,
    postalcode TEXT,
    status_id_fk INTEGER NOT NULL,   -- 1=active, 2=inactive
    ou_id_fk INTEGER NOT NULL,       -- course / organizational unit
    created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    modified TEXT
);

CREATE VIEW IF NOT EXISTS view_aduser_details AS
SELECT u.id_pk, u.username, u.firstname, u.lastname, u.email, u.phone,
       u.department, u.street, u.city, u.city_code, u.postalcode,
       s.name AS status, u.ou_id_fk AS ou, u.created, u.modified
FROM aduser u
LEFT JOIN status s ON s.id_pk = u.status_id_fk
ORDER BY u.id_pk;
"#;

pub struct SqliteStore {
    conn: Option<Connection>,
    target: String,
    columns: Vec<String>,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let target = path.display().to_string();
        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            target: target.clone(),
            reason: e.to_string(),
        })?;
        Self::init(conn, target)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            target: ":memory:".into(),
            reason: e.to_string(),
        })?;
        Self::init(conn, ":memory:".into())
    }

    fn init(conn: Connection, target: String) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(|e| StoreError::Open {
            target: target.clone(),
            reason: format!("schema setup failed: {e}"),
        })?;
        log::debug!("opened directory store {target}");
        Ok(Self { conn: Some(conn), target, columns: Vec::new() })
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }
}

fn to_value(v: &SqlValue) -> Value {
    match v {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(n) => Value::Integer(*n),
        SqlValue::Real(x) => Value::Real(*x),
        SqlValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_value_ref(v: ValueRef<'_>) -> SqlValue {
    match v {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(n) => SqlValue::Integer(n),
        ValueRef::Real(x) => SqlValue::Real(x),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Text(String::from_utf8_lossy(b).into_owned()),
    }
}

fn map_err(e: rusqlite::Error) -> StoreError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StoreError::Constraint(e.to_string()),
        _ => StoreError::Query(e.to_string()),
    }
}

impl DirectoryStore for SqliteStore {
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        let (columns, out) = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(sql).map_err(map_err)?;
            let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
            let width = columns.len();

            let mut rows = stmt
                .query(params_from_iter(params.iter().map(to_value)))
                .map_err(map_err)?;
            let mut out = Vec::new();
            while let Some(row) = rows.next().map_err(map_err)? {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(from_value_ref(row.get_ref(i).map_err(map_err)?));
                }
                out.push(values);
            }
            (columns, out)
        };

        self.columns = columns;
        Ok(out)
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, StoreError> {
        self.conn()?
            .execute(sql, params_from_iter(params.iter().map(to_value)))
            .map_err(map_err)
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn close(&mut self) -> Result<(), StoreError> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| StoreError::Query(e.to_string())),
            None => Err(StoreError::Closed),
        }
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}
