use serde::Deserialize;

use crate::error::ReconError;

pub const DEFAULT_EMAIL_DOMAIN: &str = "M-zukunftsmotor.local";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Settings for one import run.
///
/// Built from application settings by the caller, or loaded from an import
/// profile (`*.import.toml`) when a source file uses different header names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Domain appended to derived email addresses.
    pub email_domain: String,
    /// Reject rows whose org-unit code has no row in the `ou` table.
    pub validate_org_units: bool,
    pub columns: ColumnMapping,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            email_domain: DEFAULT_EMAIL_DOMAIN.into(),
            validate_org_units: false,
            columns: ColumnMapping::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Header name for each field the importer reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub firstname: String,
    pub lastname: String,
    pub org_unit: String,
    pub status: String,
    pub phone: String,
    pub department: String,
    pub street: String,
    pub city: String,
    pub city_code: String,
    pub postalcode: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            firstname: "firstname".into(),
            lastname: "lastname".into(),
            org_unit: "kurs".into(),
            status: "status_id_fk".into(),
            phone: "phone".into(),
            department: "abteilung".into(),
            street: "street".into(),
            city: "city".into(),
            city_code: "city_code".into(),
            postalcode: "postalcode".into(),
        }
    }
}

impl ColumnMapping {
    /// Columns that must be present in the header.
    pub fn required(&self) -> [&str; 4] {
        [
            self.firstname.as_str(),
            self.lastname.as_str(),
            self.org_unit.as_str(),
            self.status.as_str(),
        ]
    }

    fn all(&self) -> [(&'static str, &str); 10] {
        [
            ("firstname", self.firstname.as_str()),
            ("lastname", self.lastname.as_str()),
            ("org_unit", self.org_unit.as_str()),
            ("status", self.status.as_str()),
            ("phone", self.phone.as_str()),
            ("department", self.department.as_str()),
            ("street", self.street.as_str()),
            ("city", self.city.as_str()),
            ("city_code", self.city_code.as_str()),
            ("postalcode", self.postalcode.as_str()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ImportConfig {
    pub fn with_email_domain(mut self, domain: impl Into<String>) -> Self {
        self.email_domain = domain.into();
        self
    }

    pub fn with_org_unit_validation(mut self, on: bool) -> Self {
        self.validate_org_units = on;
        self
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ImportConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let domain = self.email_domain.trim();
        if domain.is_empty() {
            return Err(ReconError::ConfigValidation("email_domain must not be empty".into()));
        }
        if domain.contains('@') || domain.contains(char::is_whitespace) {
            return Err(ReconError::ConfigValidation(format!(
                "email_domain '{domain}' is not a bare domain"
            )));
        }

        let all = self.columns.all();
        for (field, header) in &all {
            if header.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "columns.{field} must not be empty"
                )));
            }
        }

        // Two fields reading the same header is almost certainly a typo
        for (i, (field, header)) in all.iter().enumerate() {
            if let Some((other, _)) = all[i + 1..].iter().find(|(_, h)| h == header) {
                return Err(ReconError::ConfigValidation(format!(
                    "columns.{field} and columns.{other} both map to '{header}'"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
