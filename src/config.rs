use crate::constants;
use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "importer.toml";

/// Importer settings, layered as: TOML file, then environment, then CLI flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub feed: FeedConfig,
    pub database: DatabaseConfig,
    pub import: ImportConfig,
    pub markers: MarkerConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub path: PathBuf,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Feed/Notino_hu-NotinoHU_google_all-shopping.xml"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    /// Create missing catalog tables when opening the database
    pub create_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("parfumvilag.db"),
            busy_timeout_ms: 5_000,
            create_schema: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub store_name: String,
    pub currency: String,
    pub on_entry_error: EntryErrorPolicy,
    /// Roll the transaction back instead of committing it
    pub dry_run: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            store_name: constants::DEFAULT_STORE_NAME.to_string(),
            currency: constants::DEFAULT_CURRENCY.to_string(),
            on_entry_error: EntryErrorPolicy::default(),
            dry_run: false,
        }
    }
}

/// What to do when a single accepted entry fails to normalize or load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryErrorPolicy {
    /// Abort the run; nothing is committed
    #[default]
    FailFast,
    /// Roll back just that entry and keep going
    SkipEntry,
}

impl FromStr for EntryErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(Self::FailFast),
            "skip_entry" => Ok(Self::SkipEntry),
            other => Err(format!(
                "unknown entry error policy '{other}' (expected fail_fast or skip_entry)"
            )),
        }
    }
}

impl fmt::Display for EntryErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => f.write_str("fail_fast"),
            Self::SkipEntry => f.write_str("skip_entry"),
        }
    }
}

/// Feed text markers used by the filter, the type derivation and note extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub fragrance_category: String,
    pub soap: String,
    pub eau_de_toilette: String,
    pub eau_de_parfum: String,
    pub eau_de_cologne: String,
    pub notes: String,
    pub notes_section_end: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            fragrance_category: constants::FRAGRANCE_CATEGORY_MARKER.to_string(),
            soap: constants::SOAP_MARKER.to_string(),
            eau_de_toilette: constants::EAU_DE_TOILETTE_MARKER.to_string(),
            eau_de_parfum: constants::EAU_DE_PARFUM_MARKER.to_string(),
            eau_de_cologne: constants::EAU_DE_COLOGNE_MARKER.to_string(),
            notes: constants::NOTES_MARKER.to_string(),
            notes_section_end: constants::NOTES_SECTION_END_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "importer.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus textfile written after each run
    pub textfile: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`, or from `importer.toml` when present, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Apply overrides from environment-style variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("FEED_PATH") {
            self.feed.path = PathBuf::from(path);
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(policy) = lookup("IMPORT_ON_ENTRY_ERROR") {
            self.import.on_entry_error = policy.parse().map_err(ImportError::Config)?;
        }
        if let Some(path) = lookup("METRICS_TEXTFILE") {
            self.metrics.textfile = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.import.store_name.trim().is_empty() {
            return Err(ImportError::Config("import.store_name must not be empty".into()));
        }
        if self.import.currency.trim().is_empty() {
            return Err(ImportError::Config("import.currency must not be empty".into()));
        }

        let markers = [
            ("markers.fragrance_category", &self.markers.fragrance_category),
            ("markers.soap", &self.markers.soap),
            ("markers.eau_de_toilette", &self.markers.eau_de_toilette),
            ("markers.eau_de_parfum", &self.markers.eau_de_parfum),
            ("markers.eau_de_cologne", &self.markers.eau_de_cologne),
            ("markers.notes", &self.markers.notes),
        ];
        for (key, value) in markers {
            if value.is_empty() {
                return Err(ImportError::Config(format!("{key} must not be empty")));
            }
        }
        if self.markers.notes_section_end.iter().any(|m| m.is_empty()) {
            return Err(ImportError::Config(
                "markers.notes_section_end must not contain empty markers".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_feed_vocabulary() {
        let settings = Settings::default();
        assert_eq!(settings.import.store_name, "Notino");
        assert_eq!(settings.import.currency, "HUF");
        assert_eq!(settings.import.on_entry_error, EntryErrorPolicy::FailFast);
        assert_eq!(settings.markers.notes, "Az illat fajtája:");
        assert_eq!(settings.markers.notes_section_end.len(), 9);
        assert!(!settings.database.create_schema);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [database]
            path = "/tmp/catalog.db"

            [import]
            on_entry_error = "skip_entry"
            dry_run = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.database.path, PathBuf::from("/tmp/catalog.db"));
        assert_eq!(settings.database.busy_timeout_ms, 5_000);
        assert_eq!(settings.import.on_entry_error, EntryErrorPolicy::SkipEntry);
        assert!(settings.import.dry_run);
        assert_eq!(settings.import.currency, "HUF");
        assert_eq!(settings.markers.soap, "Mýdla");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FEED_PATH", "feed.xml"),
            ("DATABASE_PATH", "other.db"),
            ("IMPORT_ON_ENTRY_ERROR", "skip-entry"),
        ]);
        let mut settings = Settings::default();
        settings
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.feed.path, PathBuf::from("feed.xml"));
        assert_eq!(settings.database.path, PathBuf::from("other.db"));
        assert_eq!(settings.import.on_entry_error, EntryErrorPolicy::SkipEntry);
        assert!(settings.metrics.textfile.is_none());
    }

    #[test]
    fn test_bad_policy_in_env_is_config_error() {
        let mut settings = Settings::default();
        let err = settings
            .apply_env(|key| (key == "IMPORT_ON_ENTRY_ERROR").then(|| "retry".to_string()))
            .unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }

    #[test]
    fn test_empty_marker_fails_validation() {
        let mut settings = Settings::default();
        settings.markers.notes_section_end.push(String::new());
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.markers.soap.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unknown_toml_policy_is_rejected() {
        let result = Settings::from_toml_str("[import]\non_entry_error = \"ignore\"\n");
        assert!(matches!(result, Err(ImportError::Toml(_))));
    }
}
