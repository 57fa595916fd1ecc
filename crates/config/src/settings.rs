// Application settings
// Loaded from ~/.config/myadmin/settings.json

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Store
    #[serde(rename = "store.database")]
    pub database: Option<String>,  // None = log in with an explicit path only

    // Import
    #[serde(rename = "import.emailDomain")]
    pub email_domain: String,

    #[serde(rename = "import.validateOrgUnits")]
    pub validate_org_units: bool,

    #[serde(rename = "import.profile")]
    pub import_profile: Option<String>,  // TOML column mapping, None = standard headers

    // Export
    #[serde(rename = "export.localFile")]
    pub export_local_file: String,

    #[serde(rename = "export.destination")]
    pub export_destination: String,

    // Logging
    #[serde(rename = "log.level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Store
            database: None,
            // Import
            email_domain: "M-zukunftsmotor.local".into(),
            validate_org_units: false,
            import_profile: None,
            // Export
            export_local_file: "ad_export.csv".into(),
            export_destination: default_export_destination().to_string_lossy().to_string(),
            // Logging
            log_level: "info".into(),
        }
    }
}

fn default_export_destination() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("myadmin")
        .join("transfer")
        .join("ad_export.csv")
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("myadmin");
        config_dir.join("settings.json")
    }

    /// Load settings from `path`. A missing file is created with commented
    /// defaults; an unreadable or malformed one yields defaults.
    ///
    /// Problems are returned rather than logged because settings are read
    /// before the logger is configured.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        if !path.exists() {
            let settings = Self::default();
            let warnings = match settings.create_default_file(path) {
                Ok(()) => Vec::new(),
                Err(e) => vec![format!("error writing default {}: {e}", path.display())],
            };
            return (settings, warnings);
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => (settings, Vec::new()),
                Err(e) => (
                    Self::default(),
                    vec![format!("error parsing {}: {e}; using default settings", path.display())],
                ),
            },
            Err(e) => (
                Self::default(),
                vec![format!("error reading {}: {e}; using default settings", path.display())],
            ),
        }
    }

    /// Parse settings JSON, ignoring `//` comment lines
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Export destination with the configured local file name
    pub fn export_paths(&self) -> (PathBuf, PathBuf) {
        (
            PathBuf::from(&self.export_local_file),
            PathBuf::from(&self.export_destination),
        )
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) -> std::io::Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let destination = serde_json::to_string(&self.export_destination)
            .unwrap_or_else(|_| "\"ad_export.csv\"".into());

        let default_config = format!(
            r#"{{
    // Directory database used when no --database is given (null = none)
    "store.database": null,

    // Bulk import
    // Derived addresses look like first.last@<emailDomain>
    "import.emailDomain": "M-zukunftsmotor.local",
    // Reject rows whose course code has no entry in the ou table
    "import.validateOrgUnits": false,
    // Optional TOML file mapping non-standard CSV headers
    "import.profile": null,

    // Transfer: export is written locally, then copied to the destination
    "export.localFile": "ad_export.csv",
    "export.destination": {destination},

    // Logging: "error", "warn", "info", "debug", "trace"
    "log.level": "info"
}}
"#
        );

        fs::write(path, default_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_writes_commented_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("myadmin").join("settings.json");

        let (settings, warnings) = Settings::load_from(&path);
        assert_eq!(settings, Settings::default());
        assert!(warnings.is_empty());
        assert!(path.exists());

        // The written file must parse back to the same values
        let (reloaded, warnings) = Settings::load_from(&path);
        assert_eq!(reloaded, settings);
        assert!(warnings.is_empty());
        assert!(fs::read_to_string(&path).unwrap().contains("// Bulk import"));
    }

    #[test]
    fn dotted_keys_and_partial_files() {
        let settings = Settings::parse(
            r#"{
    // only a couple of keys
    "store.database": "/srv/myadmin/directory.db",
    "import.validateOrgUnits": true
}"#,
        )
        .unwrap();
        assert_eq!(settings.database.as_deref(), Some("/srv/myadmin/directory.db"));
        assert!(settings.validate_org_units);
        assert_eq!(settings.email_domain, "M-zukunftsmotor.local");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ \"log.level\": ").unwrap();

        let (settings, warnings) = Settings::load_from(&path);
        assert_eq!(settings, Settings::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("using default settings"), "{warnings:?}");
    }

    #[test]
    fn unwritable_default_file_is_reported() {
        let dir = tempdir().unwrap();
        // A regular file where the config directory should be
        let blocker = dir.path().join("myadmin");
        fs::write(&blocker, "").unwrap();

        let (settings, warnings) = Settings::load_from(&blocker.join("settings.json"));
        assert_eq!(settings, Settings::default());
        assert_eq!(warnings.len(), 1);
    }
}
