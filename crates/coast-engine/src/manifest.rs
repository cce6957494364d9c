//! Image manifest types.
//!
//! The manifest is the game's only source of real-world data: a JSON object
//! with an `images` array, written by the seeder and read by the shells.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoastError, Result};

// ============================================================================
// Coast
// ============================================================================

/// Which coast a photo was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coast {
    /// West coast.
    West,
    /// East coast.
    East,
}

impl Coast {
    /// Both coasts, in manifest order.
    pub const ALL: [Self; 2] = [Self::West, Self::East];

    /// Returns the lowercase name used in ids and file paths.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::West => "west",
            Self::East => "east",
        }
    }
}

impl std::fmt::Display for Coast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Coast {
    type Err = String;

    /// Accepts `west`/`east` and the one-letter forms `w`/`e`, case-insensitively.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "west" | "w" => Ok(Self::West),
            "east" | "e" => Ok(Self::East),
            other => Err(format!("unknown coast '{other}' (expected west or east)")),
        }
    }
}

// ============================================================================
// ImageRecord
// ============================================================================

/// A single playable photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Unique identifier, e.g. `west-seattle-01`.
    pub id: String,

    /// Path of the image relative to the images directory.
    pub file: String,

    /// Display name of the depicted city.
    pub city: String,

    /// The coast the city belongs to.
    pub coast: Coast,

    /// Unsplash photo id, used by the seeder for deduplication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsplash_id: Option<String>,

    /// Photographer credit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,

    /// Link to the photo page on Unsplash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsplash_link: Option<String>,
}

impl ImageRecord {
    /// Creates a record without attribution metadata.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        file: impl Into<String>,
        city: impl Into<String>,
        coast: Coast,
    ) -> Self {
        Self {
            id: id.into(),
            file: file.into(),
            city: city.into(),
            coast,
            unsplash_id: None,
            photographer: None,
            unsplash_link: None,
        }
    }

    /// Checks that the record can enter a round.
    pub fn validate(&self) -> Result<()> {
        if self.file.trim().is_empty() {
            return Err(CoastError::invalid_record(&self.id, "file is empty"));
        }
        if self.city.trim().is_empty() {
            return Err(CoastError::invalid_record(&self.id, "city is empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// The full image manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// All known images.
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

impl Manifest {
    /// Creates a manifest from a list of records.
    #[must_use]
    pub const fn new(images: Vec<ImageRecord>) -> Self {
        Self { images }
    }

    /// Returns `true` if the manifest holds no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Returns the number of images on the given coast.
    #[must_use]
    pub fn count_for(&self, coast: Coast) -> usize {
        self.images.iter().filter(|img| img.coast == coast).count()
    }

    /// Loads and validates a manifest.
    ///
    /// # Errors
    ///
    /// Returns `CoastError::ManifestNotFound` if the file does not exist,
    /// `CoastError::ManifestParseError` on malformed JSON and
    /// `CoastError::InvalidImageRecord` if any record is unusable.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoastError::manifest_not_found(path));
            }
            Err(e) => return Err(e.into()),
        };

        let manifest: Self = serde_json::from_str(&contents)
            .map_err(|e| CoastError::manifest_parse(path, e.to_string()))?;
        manifest.validate()?;

        tracing::debug!(
            path = %path.display(),
            images = manifest.images.len(),
            "Manifest loaded"
        );
        Ok(manifest)
    }

    /// Loads a manifest for the shells.
    ///
    /// A missing file yields an empty manifest so the game can show its
    /// "no images" state. Malformed or invalid manifests are still errors.
    ///
    /// # Errors
    ///
    /// Returns every error from [`Manifest::load`] except a missing file.
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(e) if e.is_missing_data() => {
                tracing::warn!(path = %path.display(), "No image manifest found, starting with no images");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Loads a manifest, falling back to an empty one.
    ///
    /// Used by the seeder, which rebuilds the manifest incrementally and
    /// must not refuse to start because of a damaged file.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&contents) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable manifest");
                Self::default()
            }
        }
    }

    /// Validates every record.
    pub fn validate(&self) -> Result<()> {
        self.images.iter().try_for_each(ImageRecord::validate)
    }

    /// Writes the manifest as pretty-printed JSON, creating parent directories.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| CoastError::manifest_write(path, e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| CoastError::manifest_write(path, e.to_string()))?;

        tracing::debug!(path = %path.display(), images = self.images.len(), "Manifest saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
