//! Configuration file support.
//!
//! Settings load from `tanzif.toml` in the working directory, falling back
//! to the user config directory (`tanzif-pdf/config.toml`). Command-line
//! arguments take precedence over file values, which take precedence over
//! built-in defaults.
//!
//! ```toml
//! dpi = 300
//! center_content = false
//!
//! [ocr]
//! languages = "ara"
//! timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ocr::OcrConfig;
use crate::pipeline::PipelineConfig;

/// Local config file name.
const LOCAL_CONFIG: &str = "tanzif.toml";

/// Config file path under the user config directory.
const USER_CONFIG: &str = "tanzif-pdf/config.toml";

// ============================================================
// Error Types
// ============================================================

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// ============================================================
// File config
// ============================================================

/// OCR section of the config file. All fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSection {
    pub enabled: Option<bool>,
    pub languages: Option<String>,
    pub binary: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// On-disk configuration. All fields optional; unset values fall through to
/// the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dpi: Option<u32>,
    pub center_content: Option<bool>,
    pub threads: Option<usize>,
    pub max_pages: Option<usize>,
    pub ocr: OcrSection,
}

impl Config {
    /// Load from the default locations; missing files yield the default
    /// (empty) config.
    pub fn load() -> Result<Config> {
        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            return Self::load_from_path(local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let user = config_dir.join(USER_CONFIG);
            if user.exists() {
                return Self::load_from_path(&user);
            }
        }
        Ok(Config::default())
    }

    /// Load from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Path of the user config file, for display purposes.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(USER_CONFIG))
    }

    /// Merge file values with CLI overrides into a pipeline configuration.
    /// CLI wins over file, file wins over defaults.
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        let ocr_defaults = OcrConfig::default();

        PipelineConfig {
            dpi: cli.dpi.or(self.dpi).unwrap_or(defaults.dpi),
            center_content: cli
                .center_content
                .or(self.center_content)
                .unwrap_or(defaults.center_content),
            threads: cli.threads.or(self.threads),
            max_pages: cli.max_pages.or(self.max_pages),
            ocr: OcrConfig {
                enabled: cli
                    .ocr_enabled
                    .or(self.ocr.enabled)
                    .unwrap_or(ocr_defaults.enabled),
                languages: cli
                    .ocr_languages
                    .clone()
                    .or_else(|| self.ocr.languages.clone())
                    .unwrap_or(ocr_defaults.languages),
                binary: self.ocr.binary.clone(),
                timeout_secs: self.ocr.timeout_secs.unwrap_or(ocr_defaults.timeout_secs),
            },
        }
    }
}

// ============================================================
// CLI overrides
// ============================================================

/// Values the command line explicitly set. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dpi: Option<u32>,
    pub center_content: Option<bool>,
    pub threads: Option<usize>,
    pub max_pages: Option<usize>,
    pub ocr_enabled: Option<bool>,
    pub ocr_languages: Option<String>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}
