use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::SqlValue;

/// Account status as stored in `status_id_fk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub const fn code(self) -> i64 {
        match self {
            Self::Active => 1,
            Self::Inactive => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Active),
            2 => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

/// Optional contact columns, kept verbatim from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub phone: String,
    pub department: String,
    pub street: String,
    pub city: String,
    pub city_code: String,
    pub postalcode: String,
}

/// One directory-service account.
///
/// `username` is the natural key and is unique across the table. `status` and
/// `org_unit` hold raw codes: the store decides which codes exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub contact: ContactFields,
    pub status: i64,
    pub org_unit: i64,
}

/// Selects exactly one record: by primary key or by username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Id(i64),
    Username(String),
}

impl RecordKey {
    /// Numeric input selects by primary key, anything else by username.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<i64>() {
            Ok(id) => Some(Self::Id(id)),
            Err(_) => Some(Self::Username(trimmed.to_lowercase())),
        }
    }

    pub(crate) fn column(&self) -> &'static str {
        match self {
            Self::Id(_) => "id_pk",
            Self::Username(_) => "username",
        }
    }

    pub(crate) fn value(&self) -> SqlValue {
        match self {
            Self::Id(id) => SqlValue::Integer(*id),
            Self::Username(name) => SqlValue::Text(name.clone()),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Username(name) => write!(f, "username '{name}'"),
        }
    }
}

/// Replacement values for an edit. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub city_code: Option<String>,
    pub postalcode: Option<String>,
    pub status: Option<i64>,
    pub org_unit: Option<i64>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }

    /// `(column, value)` pairs for every field that is set, in column order.
    pub fn assignments(&self) -> Vec<(&'static str, SqlValue)> {
        let text = [
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("email", &self.email),
            ("phone", &self.phone),
            ("department", &self.department),
            ("street", &self.street),
            ("city", &self.city),
            ("city_code", &self.city_code),
            ("postalcode", &self.postalcode),
        ];
        let mut out: Vec<(&'static str, SqlValue)> = text
            .into_iter()
            .filter_map(|(col, v)| v.as_ref().map(|s| (col, SqlValue::Text(s.clone()))))
            .collect();
        if let Some(status) = self.status {
            out.push(("status_id_fk", SqlValue::Integer(status)));
        }
        if let Some(ou) = self.org_unit {
            out.push(("ou_id_fk", SqlValue::Integer(ou)));
        }
        out
    }
}
