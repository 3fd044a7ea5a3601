//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order (first hit wins):
//! 1. `--config <path>` on the command line
//! 2. `$SITEGRAFT_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/sitegraft/config.toml`
//! 4. `~/.sitegraft/config.toml` (canonical location)
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the endpoint must be an http(s) URL).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration.
///
/// # Example
///
/// ```toml
/// endpoint = "http://w15-sp/sites/ftclab"
///
/// [lists]
/// deprecated_template = 10003
/// replacement_suffix = "App"
///
/// [branding]
/// comment = "Updating branding"
/// pages_library = "Pages"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Base URL of the target site's repository gateway
    pub endpoint: Option<String>,

    /// Bearer token for the gateway
    pub token: Option<String>,

    /// List replacement settings
    pub lists: Option<ListsConfig>,

    /// Branding replacement settings
    pub branding: Option<BrandingConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.endpoint {
            validate_endpoint(endpoint)?;
        }

        if let Some(lists) = &self.lists {
            lists.validate()?;
        }

        if let Some(branding) = &self.branding {
            branding.validate()?;
        }

        Ok(())
    }
}

/// Check that an endpoint is an absolute http(s) URL.
pub fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidValue(format!("invalid endpoint '{}': {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue(format!(
            "invalid endpoint '{}': scheme must be http or https",
            endpoint
        )));
    }

    Ok(())
}

/// List replacement settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ListsConfig {
    /// Template id of the lists being retired
    pub deprecated_template: Option<u32>,

    /// Suffix appended to a retired list's title to name its replacement
    pub replacement_suffix: Option<String>,

    /// Template id the replacement list is created from
    pub replacement_template: Option<u32>,

    /// Delete a replacement left behind by an earlier run before recreating it
    pub recreate: Option<bool>,
}

impl ListsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(suffix) = &self.replacement_suffix {
            if suffix.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "lists.replacement_suffix cannot be empty".to_string(),
                ));
            }
        }

        if let (Some(old), Some(new)) = (self.deprecated_template, self.replacement_template) {
            if old == new {
                return Err(ConfigError::InvalidValue(format!(
                    "lists.replacement_template must differ from deprecated_template ({})",
                    old
                )));
            }
        }

        Ok(())
    }
}

/// Branding replacement settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BrandingConfig {
    /// Settings document listing the assets to replace
    pub settings: Option<String>,

    /// Comment used for check-in, publish and approve
    pub comment: Option<String>,

    /// Title of the library holding publishing pages
    pub pages_library: Option<String>,

    /// Id prefix of the gallery's master page content type
    pub master_page_content_type: Option<String>,

    /// Id prefix of the gallery's page layout content type
    pub page_layout_content_type: Option<String>,

    /// UI version stamped on uploaded master pages
    pub ui_version: Option<String>,

    /// Description stamped on uploaded master pages
    pub master_page_description: Option<String>,
}

impl BrandingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("master_page_content_type", &self.master_page_content_type),
            ("page_layout_content_type", &self.page_layout_content_type),
        ] {
            if let Some(id) = value {
                if !id.starts_with("0x") || id.len() < 3 {
                    return Err(ConfigError::InvalidValue(format!(
                        "branding.{} must be a content type id starting with 0x, got '{}'",
                        name, id
                    )));
                }
            }
        }

        if let Some(library) = &self.pages_library {
            if library.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "branding.pages_library cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
