//! Configuration types for Coast or Coast.
//!
//! Configuration is read from `coast.json`. Every field has a default, so
//! the file is optional and may list only the values being overridden.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoastError, Result};
use crate::round::FeedbackTiming;

/// The default config file name.
const CONFIG_FILE_NAME: &str = "coast.json";

/// Default manifest path.
fn default_manifest() -> String {
    "public/images.json".to_string()
}

/// Default directory holding the image files.
fn default_images_dir() -> String {
    "public/images".to_string()
}

/// Default delay after a correct guess, in milliseconds.
const fn default_correct_delay_ms() -> u64 {
    1000
}

/// Default delay after an incorrect guess, in milliseconds.
const fn default_incorrect_delay_ms() -> u64 {
    1500
}

/// Default port for the HTTP server.
const fn default_port() -> u16 {
    3000
}

const fn default_images_per_search_term() -> u32 {
    3
}

const fn default_max_images_per_city() -> u32 {
    8
}

const fn default_request_pause_ms() -> u64 {
    500
}

fn default_api_base_url() -> String {
    "https://api.unsplash.com".to_string()
}

fn default_access_key_env() -> String {
    "UNSPLASH_ACCESS_KEY".to_string()
}

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path to the image manifest.
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Directory the manifest's `file` paths are relative to.
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// Feedback pacing.
    #[serde(default)]
    pub feedback: FeedbackConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Image seeder settings.
    #[serde(default)]
    pub seeder: SeederConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            images_dir: default_images_dir(),
            feedback: FeedbackConfig::default(),
            server: ServerConfig::default(),
            seeder: SeederConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `coast.json`; falls back to defaults when it is absent.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            CoastError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads configuration from `coast.json` in the given directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `CoastError::ConfigParseError` if the file exists but is not
    /// valid JSON, and `CoastError::ConfigValidationError` if a value is out
    /// of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(CoastError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| CoastError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.manifest.trim().is_empty() {
            return Err(CoastError::config_validation(
                "manifest path must not be empty",
                "Set manifest to the location of images.json in your coast.json",
            ));
        }

        if self.images_dir.trim().is_empty() {
            return Err(CoastError::config_validation(
                "imagesDir must not be empty",
                "Set imagesDir to the directory holding the west/ and east/ folders",
            ));
        }

        if self.feedback.correct_delay_ms == 0 || self.feedback.incorrect_delay_ms == 0 {
            return Err(CoastError::config_validation(
                "feedback delays must be greater than 0",
                "Set feedback.correctDelayMs and feedback.incorrectDelayMs to at least 1",
            ));
        }

        if self.server.port == 0 {
            return Err(CoastError::config_validation(
                "server.port must be greater than 0",
                "Choose a free port such as 3000",
            ));
        }

        if self.seeder.images_per_search_term == 0 {
            return Err(CoastError::config_validation(
                "seeder.imagesPerSearchTerm must be greater than 0",
                "Set seeder.imagesPerSearchTerm to at least 1 in your coast.json",
            ));
        }

        if self.seeder.max_images_per_city == 0 {
            return Err(CoastError::config_validation(
                "seeder.maxImagesPerCity must be greater than 0",
                "Set seeder.maxImagesPerCity to at least 1 in your coast.json",
            ));
        }

        if self.seeder.api_base_url.trim().is_empty() {
            return Err(CoastError::config_validation(
                "seeder.apiBaseUrl must not be empty",
                "Remove seeder.apiBaseUrl to use https://api.unsplash.com",
            ));
        }

        Ok(())
    }

    /// Manifest path as a `PathBuf`.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        PathBuf::from(&self.manifest)
    }

    /// Images directory as a `PathBuf`.
    #[must_use]
    pub fn images_path(&self) -> PathBuf {
        PathBuf::from(&self.images_dir)
    }
}

/// Feedback pacing in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackConfig {
    /// Delay after a correct guess.
    #[serde(default = "default_correct_delay_ms")]
    pub correct_delay_ms: u64,

    /// Delay after an incorrect guess.
    #[serde(default = "default_incorrect_delay_ms")]
    pub incorrect_delay_ms: u64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            correct_delay_ms: default_correct_delay_ms(),
            incorrect_delay_ms: default_incorrect_delay_ms(),
        }
    }
}

impl FeedbackConfig {
    /// Converts to the engine's timing type.
    #[must_use]
    pub const fn timing(&self) -> FeedbackTiming {
        FeedbackTiming {
            correct: Duration::from_millis(self.correct_delay_ms),
            incorrect: Duration::from_millis(self.incorrect_delay_ms),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Image seeder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeederConfig {
    /// Photos requested per search query.
    #[serde(default = "default_images_per_search_term")]
    pub images_per_search_term: u32,

    /// Cap on images kept per city.
    #[serde(default = "default_max_images_per_city")]
    pub max_images_per_city: u32,

    /// Pause after each search request, in milliseconds.
    #[serde(default = "default_request_pause_ms")]
    pub request_pause_ms: u64,

    /// Base URL of the Unsplash API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Environment variable holding the Unsplash access key.
    #[serde(default = "default_access_key_env")]
    pub access_key_env: String,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            images_per_search_term: default_images_per_search_term(),
            max_images_per_city: default_max_images_per_city(),
            request_pause_ms: default_request_pause_ms(),
            api_base_url: default_api_base_url(),
            access_key_env: default_access_key_env(),
        }
    }
}

impl SeederConfig {
    /// Pause between search requests.
    #[must_use]
    pub const fn request_pause(&self) -> Duration {
        Duration::from_millis(self.request_pause_ms)
    }

    /// Reads the access key from the configured environment variable.
    ///
    /// Returns `None` when the variable is unset or blank.
    #[must_use]
    pub fn access_key(&self) -> Option<String> {
        std::env::var(&self.access_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

// ============================================================================
// Tests
// ============================================================================
