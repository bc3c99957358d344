//! # Config Loader
//!
//! Settings file loading and parsing.
//!
//! Responsibilities:
//! - Parse TOML/JSON settings files
//! - Validate settings
//! - Produce `TeeSettings`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load_from_path(Path::new("mtee.toml")).unwrap();
//! println!("append: {}", settings.append);
//! ```

mod parser;
mod validator;

pub use contracts::TeeSettings;
pub use parser::ConfigFormat;
pub use validator::validate;

use contracts::ContractError;
use std::path::{Path, PathBuf};

/// File name looked up in the home directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = ".mtee.toml";

/// Settings loader
///
/// Provides static methods to load settings from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from file path
    ///
    /// Detects the format from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<TeeSettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load settings from the default location if that file exists
    ///
    /// Returns defaults when there is no home directory or no file.
    pub fn load_default() -> Result<TeeSettings, ContractError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_path(&path),
            _ => Ok(TeeSettings::default()),
        }
    }

    /// `$HOME/.mtee.toml`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILE))
    }

    /// Load settings from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<TeeSettings, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize TeeSettings to TOML string
    pub fn to_toml(settings: &TeeSettings) -> Result<String, ContractError> {
        toml::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<TeeSettings, ContractError> {
        let settings = parser::parse(content, format)?;
        validator::validate(&settings)?;
        Ok(settings)
    }
}
