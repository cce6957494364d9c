//! Coast or Coast Image Seeder
//!
//! Fills the image manifest with downtown photos fetched from the Unsplash
//! search API.
//!
//! Seeding is incremental: photos already in the manifest are recognised by
//! their Unsplash id and skipped, and each city is capped so repeated runs
//! only top up cities that are short.

use std::future::Future;
use std::path::{Path, PathBuf};

use coast_engine::{Coast, CoastError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
pub mod client;
pub mod seeder;

pub use catalog::{default_catalog, CityTarget};
pub use client::UnsplashClient;
pub use seeder::{SeedOptions, Seeder};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// No access key was configured.
    #[error(
        "no Unsplash access key found in ${env}\n\nSuggestion: Get a free key from \
         https://unsplash.com/developers and export {env}=<key>"
    )]
    MissingAccessKey {
        /// The environment variable that was checked.
        env: String,
    },

    /// The HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unsplash answered with an error payload.
    #[error("Unsplash API error: {0}")]
    Api(String),

    /// Writing an image or directory failed.
    #[error("failed to write {path}: {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Saving the manifest failed.
    #[error(transparent)]
    Manifest(#[from] CoastError),
}

impl SeedError {
    /// Creates an `Io` error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ============================================================================
// Unsplash payloads
// ============================================================================

/// A photo from an Unsplash search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsplashPhoto {
    /// Unsplash photo id.
    pub id: String,
    /// Download URLs by size.
    pub urls: PhotoUrls,
    /// The photographer.
    #[serde(default)]
    pub user: Option<PhotoUser>,
    /// Related pages.
    #[serde(default)]
    pub links: Option<PhotoLinks>,
}

impl UnsplashPhoto {
    /// Photographer credit, `"Unknown"` when absent.
    pub fn photographer(&self) -> String {
        self.user
            .as_ref()
            .and_then(|user| user.name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Link to the photo's Unsplash page.
    pub fn page_link(&self) -> Option<String> {
        self.links.as_ref().and_then(|links| links.html.clone())
    }
}

/// Download URLs for a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUrls {
    /// Roughly 1080px wide.
    pub regular: String,
}

/// Photographer details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUser {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Links attached to a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoLinks {
    /// The photo page.
    #[serde(default)]
    pub html: Option<String>,
}

// ============================================================================
// PhotoSource
// ============================================================================

/// Where the seeder gets photos from.
pub trait PhotoSource {
    /// Searches for up to `per_page` landscape photos matching `term`.
    fn search(
        &self,
        term: &str,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<UnsplashPhoto>, SeedError>> + Send;

    /// Downloads `url` to `dest`.
    fn download(
        &self,
        url: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<(), SeedError>> + Send;
}

// ============================================================================
// SeedSummary
// ============================================================================

/// Outcome of a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    /// Images in the manifest after the run.
    pub total: usize,
    /// Images downloaded by this run.
    pub added: usize,
    /// Search results skipped because they were already present.
    pub duplicates_skipped: usize,
}

impl std::fmt::Display for SeedSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Total images: {}\nNew images downloaded: {}\nDuplicates skipped: {}",
            self.total, self.added, self.duplicates_skipped
        )
    }
}

/// Instructions printed when no access key is configured.
///
/// `manifest` and `images_dir` are the configured paths the shells read.
pub fn manual_seeding_instructions(env: &str, manifest: &str, images_dir: &str) -> String {
    let images_dir = images_dir.trim_end_matches('/');
    format!(
        "No {env} found.\n\
         \n\
         To download images automatically:\n\
         \x20 1. Get a free API key from https://unsplash.com/developers\n\
         \x20 2. Run: {env}=your_key coast seed\n\
         \n\
         Or add images by hand:\n\
         \x20 1. Put .jpg files in {images_dir}/{west}/ and {images_dir}/{east}/\n\
         \x20 2. Add entries to {manifest} like:\n\
         \x20    {{\n\
         \x20      \"id\": \"west-seattle-01\",\n\
         \x20      \"file\": \"west/seattle-01.jpg\",\n\
         \x20      \"city\": \"Seattle\",\n\
         \x20      \"coast\": \"west\"\n\
         \x20    }}",
        west = Coast::West,
        east = Coast::East,
    )
}
