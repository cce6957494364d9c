//! The incremental seeding run.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use coast_engine::{Coast, Config, ImageRecord, Manifest, SeederConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, warn};

use crate::catalog::{default_catalog, CityTarget};
use crate::{PhotoSource, SeedError, SeedSummary, UnsplashPhoto};

#[allow(clippy::expect_used)]
static TRAILING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(\d+)$").expect("trailing number pattern is valid"));

/// Limits for a seeding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    /// Photos requested per search term.
    pub images_per_search_term: u32,
    /// Stop adding to a city once it has this many images.
    pub max_images_per_city: usize,
    /// Pause after every search request.
    pub request_pause: Duration,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self::from(&SeederConfig::default())
    }
}

impl From<&SeederConfig> for SeedOptions {
    fn from(config: &SeederConfig) -> Self {
        Self {
            images_per_search_term: config.images_per_search_term,
            max_images_per_city: config.max_images_per_city as usize,
            request_pause: config.request_pause(),
        }
    }
}

/// Downloads photos for every catalog city and records them in the manifest.
#[derive(Debug)]
pub struct Seeder<S> {
    source: S,
    catalog: Vec<CityTarget>,
    options: SeedOptions,
    manifest_path: PathBuf,
    images_dir: PathBuf,
}

impl<S: PhotoSource> Seeder<S> {
    /// Creates a seeder over the default catalog.
    pub fn new(
        source: S,
        manifest_path: impl Into<PathBuf>,
        images_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            catalog: default_catalog(),
            options: SeedOptions::default(),
            manifest_path: manifest_path.into(),
            images_dir: images_dir.into(),
        }
    }

    /// Creates a seeder using the paths and limits from `config`.
    pub fn from_config(source: S, config: &Config) -> Self {
        Self::new(source, config.manifest_path(), config.images_path())
            .with_options(SeedOptions::from(&config.seeder))
    }

    /// Overrides the limits.
    #[must_use]
    pub const fn with_options(mut self, options: SeedOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the city catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Vec<CityTarget>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Runs one seeding pass and saves the manifest.
    ///
    /// Failed searches and downloads are logged and skipped. Only failing to
    /// create the image directories or to save the manifest is an error.
    pub async fn run(&self) -> Result<SeedSummary, SeedError> {
        for coast in Coast::ALL {
            let dir = self.images_dir.join(coast.as_str());
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| SeedError::io(&dir, e))?;
        }

        let mut manifest = Manifest::load_or_default(&self.manifest_path);
        let mut known: HashSet<String> = manifest
            .images
            .iter()
            .filter_map(|img| img.unsplash_id.clone())
            .collect();

        info!(
            existing = manifest.images.len(),
            tracked = known.len(),
            "Starting image seeding"
        );

        let mut summary = SeedSummary::default();
        for city in &self.catalog {
            self.seed_city(city, &mut manifest, &mut known, &mut summary)
                .await;
        }

        manifest.save(&self.manifest_path).await?;
        summary.total = manifest.images.len();

        info!(
            total = summary.total,
            added = summary.added,
            duplicates_skipped = summary.duplicates_skipped,
            manifest = %self.manifest_path.display(),
            "Seeding finished"
        );
        Ok(summary)
    }

    async fn seed_city(
        &self,
        city: &CityTarget,
        manifest: &mut Manifest,
        known: &mut HashSet<String>,
        summary: &mut SeedSummary,
    ) {
        let cap = self.options.max_images_per_city;
        let existing = city_image_count(manifest, city);
        if existing >= cap {
            info!(city = city.name, existing, cap, "City already full, skipping");
            return;
        }

        info!(city = city.name, existing, cap, "Seeding city");
        let mut added = 0;
        let mut next_number = next_image_number(manifest, city);

        for term in city.search_terms {
            if existing + added >= cap {
                break;
            }

            match self
                .source
                .search(term, self.options.images_per_search_term)
                .await
            {
                Ok(photos) => {
                    for photo in photos {
                        if known.contains(&photo.id) {
                            summary.duplicates_skipped += 1;
                            continue;
                        }
                        if existing + added >= cap {
                            break;
                        }

                        match self.fetch(city, &photo, next_number).await {
                            Ok(record) => {
                                known.insert(photo.id.clone());
                                manifest.images.push(record);
                                added += 1;
                                next_number += 1;
                            }
                            Err(e) => {
                                error!(city = city.name, photo = %photo.id, error = %e, "Download failed");
                            }
                        }
                    }

                    tokio::time::sleep(self.options.request_pause).await;
                }
                Err(e) => {
                    error!(city = city.name, term, error = %e, "Search failed");
                }
            }
        }

        if added > 0 {
            info!(city = city.name, added, "Added new images");
        }
        summary.added += added;
    }

    async fn fetch(
        &self,
        city: &CityTarget,
        photo: &UnsplashPhoto,
        number: u32,
    ) -> Result<ImageRecord, SeedError> {
        let stem = format!("{}-{number:02}", city.slug);
        let file = format!("{}/{stem}.jpg", city.coast);
        let dest = self.images_dir.join(&file);

        info!(file = %file, "Downloading");
        self.source.download(&photo.urls.regular, &dest).await?;

        let mut record = ImageRecord::new(
            format!("{}-{stem}", city.coast),
            file,
            city.name,
            city.coast,
        );
        record.unsplash_id = Some(photo.id.clone());
        record.photographer = Some(photo.photographer());
        record.unsplash_link = photo.page_link();
        Ok(record)
    }
}

/// Images already recorded for `city`.
fn city_image_count(manifest: &Manifest, city: &CityTarget) -> usize {
    let prefix = city.id_prefix();
    manifest
        .images
        .iter()
        .filter(|img| img.coast == city.coast && img.id.contains(&prefix))
        .count()
}

/// One past the highest number used by `city`, or 1 if it has no images.
fn next_image_number(manifest: &Manifest, city: &CityTarget) -> u32 {
    let prefix = city.id_prefix();
    manifest
        .images
        .iter()
        .filter(|img| img.coast == city.coast && img.id.starts_with(&prefix))
        .map(|img| {
            TRAILING_NUMBER
                .captures(&img.id)
                .and_then(|caps| caps[1].parse::<u32>().ok())
                .unwrap_or_else(|| {
                    warn!(id = %img.id, "Image id has no trailing number");
                    0
                })
        })
        .max()
        .map_or(1, |max| max + 1)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;
    use crate::{PhotoUrls, PhotoUser};

    /// Serves canned search results and writes placeholder bytes.
    #[derive(Default)]
    struct FakeSource {
        results: HashMap<&'static str, Vec<UnsplashPhoto>>,
        failing_terms: HashSet<&'static str>,
        searches: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, term: &'static str, ids: &[&str]) -> Self {
            self.results
                .insert(term, ids.iter().map(|id| photo(id)).collect());
            self
        }

        fn failing(mut self, term: &'static str) -> Self {
            self.failing_terms.insert(term);
            self
        }
    }

    impl PhotoSource for FakeSource {
        async fn search(&self, term: &str, per_page: u32) -> Result<Vec<UnsplashPhoto>, SeedError> {
            self.searches.lock().unwrap().push(term.to_string());
            if self.failing_terms.contains(term) {
                return Err(SeedError::Api("Rate Limit Exceeded".to_string()));
            }
            let mut photos = self.results.get(term).cloned().unwrap_or_default();
            photos.truncate(per_page as usize);
            Ok(photos)
        }

        async fn download(&self, url: &str, dest: &Path) -> Result<(), SeedError> {
            tokio::fs::write(dest, url.as_bytes())
                .await
                .map_err(|e| SeedError::io(dest, e))
        }
    }

    fn photo(id: &str) -> UnsplashPhoto {
        UnsplashPhoto {
            id: id.to_string(),
            urls: PhotoUrls {
                regular: format!("https://images.example/{id}"),
            },
            user: Some(PhotoUser {
                name: Some(format!("Photographer {id}")),
            }),
            links: None,
        }
    }

    fn seattle() -> CityTarget {
        CityTarget {
            coast: Coast::West,
            slug: "seattle",
            name: "Seattle",
            search_terms: &["seattle skyline", "seattle downtown"],
        }
    }

    fn options(max_images_per_city: usize) -> SeedOptions {
        SeedOptions {
            images_per_search_term: 3,
            max_images_per_city,
            request_pause: Duration::ZERO,
        }
    }

    fn seeder(source: FakeSource, dir: &TempDir, max: usize) -> Seeder<FakeSource> {
        Seeder::new(
            source,
            dir.path().join("images.json"),
            dir.path().join("images"),
        )
        .with_catalog(vec![seattle()])
        .with_options(options(max))
    }

    fn existing(id: &str, unsplash_id: &str) -> ImageRecord {
        let mut record = ImageRecord::new(id, "west/x.jpg", "Seattle", Coast::West);
        record.unsplash_id = Some(unsplash_id.to_string());
        record
    }

    #[tokio::test]
    async fn test_seeds_empty_manifest() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::default().with("seattle skyline", &["a", "b"]);

        let summary = seeder(source, &dir, 8).run().await.unwrap();

        assert_eq!(
            summary,
            SeedSummary {
                total: 2,
                added: 2,
                duplicates_skipped: 0,
            }
        );

        let manifest = Manifest::load(&dir.path().join("images.json")).unwrap();
        let ids: Vec<_> = manifest.images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["west-seattle-01", "west-seattle-02"]);

        let first = &manifest.images[0];
        assert_eq!(first.file, "west/seattle-01.jpg");
        assert_eq!(first.unsplash_id.as_deref(), Some("a"));
        assert_eq!(first.photographer.as_deref(), Some("Photographer a"));
        assert!(dir.path().join("images/west/seattle-01.jpg").exists());
        assert!(dir.path().join("images/east").is_dir());
    }

    #[tokio::test]
    async fn test_skips_known_photos_and_continues_numbering() {
        let dir = TempDir::new().unwrap();
        Manifest::new(vec![
            existing("west-seattle-01", "a"),
            existing("west-seattle-07", "z"),
        ])
        .save(&dir.path().join("images.json"))
        .await
        .unwrap();

        let source = FakeSource::default().with("seattle skyline", &["a", "c"]);
        let summary = seeder(source, &dir, 8).run().await.unwrap();

        assert_eq!(summary.added, 1);
        assert_eq!(summary.duplicates_skipped, 1);
        assert_eq!(summary.total, 3);

        let manifest = Manifest::load(&dir.path().join("images.json")).unwrap();
        assert_eq!(manifest.images[2].id, "west-seattle-08");
        assert_eq!(manifest.images[2].file, "west/seattle-08.jpg");
    }

    #[tokio::test]
    async fn test_city_cap_stops_downloads_and_searches() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::default()
            .with("seattle skyline", &["a", "b", "c"])
            .with("seattle downtown", &["d"]);

        let seeder = seeder(source, &dir, 2);
        let summary = seeder.run().await.unwrap();

        assert_eq!(summary.added, 2);
        assert_eq!(*seeder.source.searches.lock().unwrap(), vec!["seattle skyline"]);
    }

    #[tokio::test]
    async fn test_full_city_is_not_searched() {
        let dir = TempDir::new().unwrap();
        Manifest::new(vec![existing("west-seattle-01", "a")])
            .save(&dir.path().join("images.json"))
            .await
            .unwrap();

        let seeder = seeder(FakeSource::default().with("seattle skyline", &["b"]), &dir, 1);
        let summary = seeder.run().await.unwrap();

        assert_eq!(summary.added, 0);
        assert_eq!(summary.total, 1);
        assert!(seeder.source.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_errors_are_skipped() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::default()
            .failing("seattle skyline")
            .with("seattle downtown", &["d"]);

        let summary = seeder(source, &dir, 8).run().await.unwrap();

        assert_eq!(summary.added, 1);
        let manifest = Manifest::load(&dir.path().join("images.json")).unwrap();
        assert_eq!(manifest.images[0].id, "west-seattle-01");
    }

    #[tokio::test]
    async fn test_failed_searches_do_not_pause() {
        let dir = TempDir::new().unwrap();
        let source = FakeSource::default()
            .failing("seattle skyline")
            .failing("seattle downtown");
        let seeder = seeder(source, &dir, 8).with_options(SeedOptions {
            request_pause: Duration::from_secs(3600),
            ..options(8)
        });

        let summary = tokio::time::timeout(Duration::from_secs(5), seeder.run())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.added, 0);
        assert_eq!(seeder.source.searches.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_manifest_starts_fresh() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("images.json"), "not json").unwrap();

        let source = FakeSource::default().with("seattle skyline", &["a"]);
        let summary = seeder(source, &dir, 8).run().await.unwrap();

        assert_eq!(summary.total, 1);
    }

    #[test]
    fn test_next_image_number() {
        let city = seattle();
        assert_eq!(next_image_number(&Manifest::default(), &city), 1);

        let manifest = Manifest::new(vec![
            existing("west-seattle-03", "a"),
            existing("west-seattle-10", "b"),
            existing("west-portland-42", "c"),
        ]);
        assert_eq!(next_image_number(&manifest, &city), 11);
    }

    #[test]
    fn test_city_image_count_matches_coast_and_prefix() {
        let mut east = existing("west-seattle-09", "x");
        east.coast = Coast::East;

        let manifest = Manifest::new(vec![
            existing("west-seattle-01", "a"),
            existing("west-seattle-02", "b"),
            existing("west-portland-01", "c"),
            east,
        ]);
        assert_eq!(city_image_count(&manifest, &seattle()), 2);
    }

    #[test]
    fn test_options_from_config() {
        let options = SeedOptions::default();
        assert_eq!(options.images_per_search_term, 3);
        assert_eq!(options.max_images_per_city, 8);
        assert_eq!(options.request_pause, Duration::from_millis(500));
    }
}
