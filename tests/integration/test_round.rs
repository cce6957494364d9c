//! End-to-end round tests: manifest on disk through to the game over result.
//!
//! Rounds run on a fake clock so feedback delays are checked exactly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use coast_engine::{
    build_sequence_with, Coast, Config, GameOver, GuessOutcome, IgnoreReason, ImageRecord,
    Manifest, ManualScheduler, RngShuffler, RoundHandle, RoundOptions, RoundPhase,
};
use tempfile::TempDir;

const MANIFEST_JSON: &str = r#"{
  "images": [
    { "id": "west-seattle-01", "file": "west/seattle-01.jpg", "city": "Seattle", "coast": "west" },
    { "id": "west-denver-01", "file": "west/denver-01.jpg", "city": "Denver", "coast": "west",
      "unsplashId": "u-denver", "photographer": "Someone" },
    { "id": "west-phoenix-01", "file": "west/phoenix-01.jpg", "city": "Phoenix", "coast": "west" },
    { "id": "east-miami-01", "file": "east/miami-01.jpg", "city": "Miami", "coast": "east" },
    { "id": "east-boston-01", "file": "east/boston-01.jpg", "city": "Boston", "coast": "east" }
  ]
}"#;

fn load_manifest(dir: &TempDir) -> Manifest {
    let path = dir.path().join("images.json");
    std::fs::write(&path, MANIFEST_JSON).expect("write manifest");
    Manifest::load(&path).expect("load manifest")
}

fn opposite(coast: Coast) -> Coast {
    match coast {
        Coast::West => Coast::East,
        Coast::East => Coast::West,
    }
}

struct Game {
    scheduler: Arc<ManualScheduler>,
    handle: RoundHandle,
    results: Arc<Mutex<Vec<GameOver>>>,
}

fn start(images: &[ImageRecord], seed: u64) -> Game {
    let scheduler = Arc::new(ManualScheduler::new());
    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&results);

    let sequence = build_sequence_with(images, &mut RngShuffler::seeded(seed));
    let handle = RoundHandle::with_sequence(
        sequence,
        RoundOptions::new(scheduler.clone()),
        move |result| sink.lock().expect("results lock").push(result),
    );

    Game {
        scheduler,
        handle,
        results,
    }
}

#[test]
fn test_perfect_game_from_manifest_file() {
    let dir = TempDir::new().expect("temp dir");
    let manifest = load_manifest(&dir);
    let game = start(&manifest.images, 42);

    // 3 west and 2 east images balance down to 2 + 2.
    assert_eq!(game.handle.progress().total, 4);

    let mut seen = Vec::new();
    while let Some(image) = game.handle.current_image() {
        if game.handle.state().is_terminal() {
            break;
        }
        seen.push(image.id.clone());
        assert!(game.handle.submit_guess(image.coast).is_accepted());
        game.scheduler.advance(Duration::from_millis(1000));
    }

    assert_eq!(seen.len(), 4);
    assert_eq!(
        *game.results.lock().expect("results lock"),
        vec![GameOver {
            final_score: 4,
            offending_city: None,
        }]
    );
}

#[test]
fn test_miss_on_third_image() {
    let dir = TempDir::new().expect("temp dir");
    let manifest = load_manifest(&dir);
    let game = start(&manifest.images, 7);

    for _ in 0..2 {
        let image = game.handle.current_image().expect("image");
        game.handle.submit_guess(image.coast);
        game.scheduler.advance(Duration::from_millis(1000));
    }

    let third = game.handle.current_image().expect("third image");
    let outcome = game.handle.submit_guess(opposite(third.coast));
    match outcome {
        GuessOutcome::Accepted(feedback) => {
            assert!(!feedback.is_correct);
            assert_eq!(feedback.city, third.city);
        }
        GuessOutcome::Ignored(reason) => unreachable!("guess ignored: {reason}"),
    }

    // Wrong answers stay on screen for 1.5s.
    game.scheduler.advance(Duration::from_millis(1499));
    assert!(game.results.lock().expect("results lock").is_empty());
    game.scheduler.advance(Duration::from_millis(1));

    let results = game.results.lock().expect("results lock").clone();
    assert_eq!(
        results,
        vec![GameOver {
            final_score: 2,
            offending_city: Some(third.city),
        }]
    );
    assert_eq!(results[0].message(), "Not bad!");
}

#[test]
fn test_input_during_feedback_is_dropped() {
    let dir = TempDir::new().expect("temp dir");
    let manifest = load_manifest(&dir);
    let game = start(&manifest.images, 1);

    let first = game.handle.current_image().expect("image");
    game.handle.submit_guess(first.coast);

    for _ in 0..5 {
        assert_eq!(
            game.handle.submit_guess(opposite(first.coast)),
            GuessOutcome::Ignored(IgnoreReason::FeedbackPending)
        );
    }

    game.scheduler.advance(Duration::from_millis(1000));
    assert_eq!(game.handle.current_streak(), 1);
    assert_eq!(game.handle.progress().position, 1);
    assert_eq!(game.handle.state().phase, RoundPhase::AwaitingGuess);
}

#[test]
fn test_one_sided_manifest_cannot_be_played() {
    let images = vec![
        ImageRecord::new("west-seattle-01", "west/seattle-01.jpg", "Seattle", Coast::West),
        ImageRecord::new("west-denver-01", "west/denver-01.jpg", "Denver", Coast::West),
    ];
    let game = start(&images, 3);

    assert!(game.handle.current_image().is_none());
    assert_eq!(
        game.handle.submit_guess(Coast::West),
        GuessOutcome::Ignored(IgnoreReason::NoImage)
    );
    assert_eq!(game.scheduler.pending(), 0);
    assert!(game.results.lock().expect("results lock").is_empty());
}

#[test]
fn test_default_config_pacing() {
    let timing = Config::default().feedback.timing();
    assert_eq!(timing.correct, Duration::from_millis(1000));
    assert_eq!(timing.incorrect, Duration::from_millis(1500));
}
