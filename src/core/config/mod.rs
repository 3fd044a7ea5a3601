//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. An explicit path (from `--config`), which must exist
//! 2. `$SITEGRAFT_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/sitegraft/config.toml`
//! 4. `~/.sitegraft/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use sitegraft::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Pages library: {}", config.pages_library());
//! println!("Deprecated template: {}", config.deprecated_template());
//! ```

pub mod schema;

pub use schema::{BrandingConfig, FileConfig, ListsConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "SITEGRAFT_CONFIG";

/// Template id of the custom list template being retired.
pub const DEFAULT_DEPRECATED_TEMPLATE: u32 = 10003;

/// Template id of a plain document library.
pub const DEFAULT_REPLACEMENT_TEMPLATE: u32 = 101;

pub const DEFAULT_REPLACEMENT_SUFFIX: &str = "App";

pub const DEFAULT_COMMENT: &str = "Updating branding";

pub const DEFAULT_PAGES_LIBRARY: &str = "Pages";

/// Master Page content type id.
pub const DEFAULT_MASTER_PAGE_CONTENT_TYPE: &str = "0x010105";

/// Page Layout content type id.
pub const DEFAULT_PAGE_LAYOUT_CONTENT_TYPE: &str =
    "0x01010007FF3E057FA8AB4AA42FCB67B453FFC100E214EEE741181F4E9F7ACC43278EE811";

pub const DEFAULT_UI_VERSION: &str = "15";

pub const DEFAULT_MASTER_PAGE_DESCRIPTION: &str = "Master page uploaded by sitegraft";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: FileConfig,
    /// Path the config was loaded from, if any
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// If `explicit` is provided it must exist. Otherwise the standard
    /// locations are searched and a missing file means defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read,
    /// parsed, or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find(),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };

        let file = Self::read(&path)?;
        file.validate()?;

        Ok(Self {
            file,
            loaded_from: Some(path),
        })
    }

    /// Build a config from an already-parsed file.
    pub fn from_file(file: FileConfig) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self {
            file,
            loaded_from: None,
        })
    }

    fn find() -> Option<PathBuf> {
        // 1. Check $SITEGRAFT_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/sitegraft/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("sitegraft/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.sitegraft/config.toml
        let path = dirs::home_dir()?.join(".sitegraft/config.toml");
        path.exists().then_some(path)
    }

    fn read(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Get the configured endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        self.file.endpoint.as_deref()
    }

    /// Get the configured token, if any.
    pub fn token(&self) -> Option<&str> {
        self.file.token.as_deref()
    }

    fn lists(&self) -> Option<&ListsConfig> {
        self.file.lists.as_ref()
    }

    fn branding(&self) -> Option<&BrandingConfig> {
        self.file.branding.as_ref()
    }

    /// Template id of lists to replace. Defaults to 10003.
    pub fn deprecated_template(&self) -> u32 {
        self.lists()
            .and_then(|l| l.deprecated_template)
            .unwrap_or(DEFAULT_DEPRECATED_TEMPLATE)
    }

    /// Template id for replacement lists. Defaults to 101 (document library).
    pub fn replacement_template(&self) -> u32 {
        self.lists()
            .and_then(|l| l.replacement_template)
            .unwrap_or(DEFAULT_REPLACEMENT_TEMPLATE)
    }

    /// Suffix for replacement list titles. Defaults to "App".
    pub fn replacement_suffix(&self) -> &str {
        self.lists()
            .and_then(|l| l.replacement_suffix.as_deref())
            .unwrap_or(DEFAULT_REPLACEMENT_SUFFIX)
    }

    /// Whether leftovers from a previous run are deleted first. Defaults to `true`.
    pub fn recreate(&self) -> bool {
        self.lists().and_then(|l| l.recreate).unwrap_or(true)
    }

    /// Settings document path, if configured.
    pub fn settings_path(&self) -> Option<&str> {
        self.branding().and_then(|b| b.settings.as_deref())
    }

    /// Workflow comment. Defaults to "Updating branding".
    pub fn comment(&self) -> &str {
        self.branding()
            .and_then(|b| b.comment.as_deref())
            .unwrap_or(DEFAULT_COMMENT)
    }

    /// Pages library title. Defaults to "Pages".
    pub fn pages_library(&self) -> &str {
        self.branding()
            .and_then(|b| b.pages_library.as_deref())
            .unwrap_or(DEFAULT_PAGES_LIBRARY)
    }

    pub fn master_page_content_type(&self) -> &str {
        self.branding()
            .and_then(|b| b.master_page_content_type.as_deref())
            .unwrap_or(DEFAULT_MASTER_PAGE_CONTENT_TYPE)
    }

    pub fn page_layout_content_type(&self) -> &str {
        self.branding()
            .and_then(|b| b.page_layout_content_type.as_deref())
            .unwrap_or(DEFAULT_PAGE_LAYOUT_CONTENT_TYPE)
    }

    pub fn ui_version(&self) -> &str {
        self.branding()
            .and_then(|b| b.ui_version.as_deref())
            .unwrap_or(DEFAULT_UI_VERSION)
    }

    pub fn master_page_description(&self) -> &str {
        self.branding()
            .and_then(|b| b.master_page_description.as_deref())
            .unwrap_or(DEFAULT_MASTER_PAGE_DESCRIPTION)
    }

    /// Get the path the config was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_without_file() {
        let config = Config::default();
        assert_eq!(config.deprecated_template(), 10003);
        assert_eq!(config.replacement_template(), 101);
        assert_eq!(config.replacement_suffix(), "App");
        assert!(config.recreate());
        assert_eq!(config.comment(), "Updating branding");
        assert_eq!(config.pages_library(), "Pages");
        assert_eq!(config.master_page_content_type(), "0x010105");
        assert!(config.page_layout_content_type().starts_with("0x01010007FF3E"));
        assert_eq!(config.ui_version(), "15");
        assert!(config.endpoint().is_none());
        assert!(config.loaded_from().is_none());
    }

    #[test]
    fn load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
endpoint = "https://contoso.example/sites/lab"

[lists]
replacement_suffix = "V2"

[branding]
pages_library = "SitePages"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.endpoint(), Some("https://contoso.example/sites/lab"));
        assert_eq!(config.replacement_suffix(), "V2");
        assert_eq!(config.pages_library(), "SitePages");
        assert_eq!(config.comment(), DEFAULT_COMMENT);
        assert_eq!(config.loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/sitegraft.toml")));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn parse_error_names_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "endpoint = [").unwrap();

        match Config::load(Some(&path)) {
            Err(ConfigError::ParseError { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_values_rejected_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "endpoint = \"ftp://nope\"").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn from_file_validates() {
        let file = FileConfig {
            endpoint: Some("http://host/site".into()),
            ..Default::default()
        };
        assert!(Config::from_file(file).is_ok());

        let bad = FileConfig {
            lists: Some(ListsConfig {
                replacement_suffix: Some(String::new()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(Config::from_file(bad).is_err());
    }
}
