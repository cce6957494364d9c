//! Builds the balanced, shuffled order of images for one game.
//!
//! Both coasts contribute the same number of photos so that always guessing
//! one side scores no better than chance.

use std::ops::Index;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::manifest::{Coast, ImageRecord};

// ============================================================================
// Shuffler
// ============================================================================

/// Source of permutations for the sequencer.
///
/// Production code uses [`RngShuffler`]; tests can supply a deterministic
/// implementation to assert exact orderings.
pub trait Shuffler {
    /// Permutes `items` in place.
    fn shuffle<T>(&mut self, items: &mut [T]);
}

/// Uniform Fisher–Yates shuffling backed by a [`Rng`].
#[derive(Debug, Clone)]
pub struct RngShuffler<R>(pub R);

impl<R: Rng> Shuffler for RngShuffler<R> {
    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.0);
    }
}

impl RngShuffler<rand::rngs::ThreadRng> {
    /// Shuffler seeded from the thread-local generator.
    #[must_use]
    pub fn thread() -> Self {
        Self(rand::rng())
    }
}

impl RngShuffler<ChaCha8Rng> {
    /// Reproducible shuffler for a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

// ============================================================================
// PlaySequence
// ============================================================================

/// The immutable order of images for one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlaySequence(Vec<ImageRecord>);

impl PlaySequence {
    /// Number of images in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there is nothing to play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the image at `position`, if any.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&ImageRecord> {
        self.0.get(position)
    }

    /// Iterates over the images in play order.
    pub fn iter(&self) -> std::slice::Iter<'_, ImageRecord> {
        self.0.iter()
    }

    /// Number of images on the given coast.
    #[must_use]
    pub fn count_for(&self, coast: Coast) -> usize {
        self.0.iter().filter(|img| img.coast == coast).count()
    }

    /// Wraps an already ordered list without balancing or shuffling it.
    ///
    /// Shells and tests use this to replay a known order.
    #[must_use]
    pub const fn from_ordered(images: Vec<ImageRecord>) -> Self {
        Self(images)
    }
}

impl Index<usize> for PlaySequence {
    type Output = ImageRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a PlaySequence {
    type Item = &'a ImageRecord;
    type IntoIter = std::slice::Iter<'a, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// Sequencing
// ============================================================================

/// Builds a play sequence with fresh randomness.
#[must_use]
pub fn build_sequence(images: &[ImageRecord]) -> PlaySequence {
    build_sequence_with(images, &mut RngShuffler::thread())
}

/// Builds a play sequence using the given shuffler.
///
/// Each coast is shuffled and cut to the size of the smaller coast, then the
/// combined list is shuffled again. If either coast has no images the
/// result is empty.
pub fn build_sequence_with<S: Shuffler + ?Sized>(
    images: &[ImageRecord],
    shuffler: &mut S,
) -> PlaySequence {
    let (mut west, mut east): (Vec<ImageRecord>, Vec<ImageRecord>) = images
        .iter()
        .cloned()
        .partition(|img| img.coast == Coast::West);

    let min_count = west.len().min(east.len());

    shuffler.shuffle(&mut west);
    shuffler.shuffle(&mut east);
    west.truncate(min_count);
    east.truncate(min_count);

    let mut balanced = west;
    balanced.append(&mut east);
    shuffler.shuffle(&mut balanced);

    tracing::debug!(
        input = images.len(),
        per_coast = min_count,
        total = balanced.len(),
        "Play sequence built"
    );

    PlaySequence(balanced)
}

// ============================================================================
// Tests
// ============================================================================
