//! HTTP client for the Unsplash API.

use std::path::Path;

use coast_engine::SeederConfig;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::debug;

use crate::{PhotoSource, SeedError, UnsplashPhoto};

/// Body of `GET /search/photos`.
#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
    #[serde(default)]
    errors: Option<Vec<String>>,
}

/// Client for the Unsplash search and download endpoints.
#[derive(Debug, Clone)]
pub struct UnsplashClient {
    http: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl UnsplashClient {
    /// Creates a client against `base_url` using `access_key`.
    pub fn new(base_url: impl Into<String>, access_key: impl Into<String>) -> Result<Self, SeedError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("coast-seeder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_key: access_key.into(),
        })
    }

    /// Creates a client from seeder settings.
    ///
    /// Fails with [`SeedError::MissingAccessKey`] when the configured
    /// environment variable is unset or blank.
    pub fn from_config(config: &SeederConfig) -> Result<Self, SeedError> {
        let access_key = config
            .access_key()
            .ok_or_else(|| SeedError::MissingAccessKey {
                env: config.access_key_env.clone(),
            })?;
        Self::new(&config.api_base_url, access_key)
    }

    fn search_url(&self) -> String {
        format!("{}/search/photos", self.base_url)
    }
}

impl PhotoSource for UnsplashClient {
    async fn search(&self, term: &str, per_page: u32) -> Result<Vec<UnsplashPhoto>, SeedError> {
        let per_page = per_page.to_string();
        let response = self
            .http
            .get(self.search_url())
            .header(AUTHORIZATION, format!("Client-ID {}", self.access_key))
            .query(&[
                ("query", term),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body: SearchResponse = response.json().await.or_else(|e| {
            if status.is_success() {
                Err(SeedError::Http(e))
            } else {
                Ok(SearchResponse::default())
            }
        })?;

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            return Err(SeedError::Api(errors.join(", ")));
        }
        if !status.is_success() {
            return Err(SeedError::Api(format!("search returned {status}")));
        }

        debug!(term, results = body.results.len(), "Search complete");
        Ok(body.results)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), SeedError> {
        // reqwest follows redirects by default.
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| SeedError::io(dest, e))?;

        debug!(path = %dest.display(), bytes = bytes.len(), "Image saved");
        Ok(())
    }
}
