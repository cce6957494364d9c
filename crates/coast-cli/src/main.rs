//! Coast or Coast CLI
//!
//! Serves the game over HTTP, plays it in the terminal, or seeds the image
//! set from Unsplash.

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use coast_engine::{
    build_sequence, create_router, AppState, Coast, Config, FeedbackTiming, GameOver,
    GuessOutcome, IgnoreReason, Manifest, PlaySequence, RoundHandle, RoundOptions, RoundSnapshot,
};
use coast_seeder::{manual_seeding_instructions, Seeder, UnsplashClient};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Coast or Coast - guess which coast a downtown photo was taken on
#[derive(Parser, Debug)]
#[command(name = "coast")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: coast.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API, WebSocket events and image files
    Serve {
        /// Port for the HTTP server (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the image manifest
        #[arg(short, long, value_name = "FILE")]
        manifest: Option<String>,
    },

    /// Play a round in the terminal
    Play {
        /// Path to the image manifest
        #[arg(short, long, value_name = "FILE")]
        manifest: Option<String>,
    },

    /// Download images from Unsplash into the manifest
    Seed {
        /// Path to the image manifest
        #[arg(short, long, value_name = "FILE")]
        manifest: Option<String>,

        /// Directory to store downloaded images
        #[arg(short, long, value_name = "DIR")]
        images_dir: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(config = ?args.config, command = ?args.command, "Starting");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Serve { port, manifest } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(manifest) = manifest {
                config.manifest = manifest;
            }
            config.validate()?;
            serve(config).await
        }
        Command::Play { manifest } => {
            if let Some(manifest) = manifest {
                config.manifest = manifest;
            }
            config.validate()?;
            play(config).await
        }
        Command::Seed {
            manifest,
            images_dir,
        } => {
            if let Some(manifest) = manifest {
                config.manifest = manifest;
            }
            if let Some(images_dir) = images_dir {
                config.images_dir = images_dir;
            }
            config.validate()?;
            seed(config).await
        }
    }
}

/// Loads configuration from the given path or the current directory.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Loads the manifest. A missing file is an empty image set.
fn load_manifest(config: &Config) -> anyhow::Result<Manifest> {
    let path = config.manifest_path();
    tracing::info!(manifest = %path.display(), "Loading manifest");
    let manifest = Manifest::load_or_empty(&path)?;

    println!(
        "Loaded {} images ({} west, {} east)",
        manifest.images.len(),
        manifest.count_for(Coast::West),
        manifest.count_for(Coast::East)
    );
    Ok(manifest)
}

// ============================================================================
// serve
// ============================================================================

async fn serve(config: Config) -> anyhow::Result<()> {
    let manifest = load_manifest(&config)?;
    let addr: SocketAddr = ([0, 0, 0, 0], config.server.port).into();

    let router = create_router(AppState::new(config, manifest));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("Coast or Coast running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        })
        .await?;
    Ok(())
}

// ============================================================================
// play
// ============================================================================

/// Something the terminal shell has to show.
enum PlayEvent {
    Transition(RoundSnapshot),
    Finished(GameOver),
}

/// How a terminal round ended.
#[derive(Debug, PartialEq, Eq)]
enum RoundEnd {
    Finished(GameOver),
    InputClosed,
    Interrupted,
}

async fn play(config: Config) -> anyhow::Result<()> {
    let manifest = load_manifest(&config)?;
    let images_dir = config.images_path();

    let (handle, mut events) =
        start_terminal_round(build_sequence(&manifest.images), config.feedback.timing());

    let start = handle.snapshot();
    if start.current_image.is_none() {
        println!("Not enough images to play. Both coasts need at least one photo.");
        println!("Run `coast seed` or add images to {}.", config.manifest);
        return Ok(());
    }

    println!();
    println!("Guess the coast: type `w` for West or `e` for East, then Enter.");
    print_prompt(&start, &images_dir);

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let input = BufReader::new(tokio::io::stdin());

    match drive_round(&handle, &mut events, input, shutdown, &images_dir).await? {
        RoundEnd::Finished(result) => print_game_over(&result),
        RoundEnd::InputClosed => println!("Input closed, quitting."),
        RoundEnd::Interrupted => tracing::info!("Received Ctrl+C, quitting round"),
    }
    Ok(())
}

/// Starts a round whose transitions and result arrive on a channel.
fn start_terminal_round(
    sequence: PlaySequence,
    timing: FeedbackTiming,
) -> (RoundHandle, mpsc::UnboundedReceiver<PlayEvent>) {
    let (tx, events) = mpsc::unbounded_channel();
    let transitions = tx.clone();
    let options = RoundOptions::default()
        .with_timing(timing)
        .with_observer(move |snapshot| {
            let _ = transitions.send(PlayEvent::Transition(snapshot.clone()));
        });

    let handle = RoundHandle::with_sequence(sequence, options, move |result| {
        let _ = tx.send(PlayEvent::Finished(result));
    });
    (handle, events)
}

/// Feeds typed lines into the round until it ends, input closes or
/// `shutdown` completes.
async fn drive_round(
    handle: &RoundHandle,
    events: &mut mpsc::UnboundedReceiver<PlayEvent>,
    input: impl AsyncBufRead + Unpin,
    shutdown: impl Future<Output = ()>,
    images_dir: &Path,
) -> anyhow::Result<RoundEnd> {
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = events.recv() => match event {
                PlayEvent::Transition(snapshot) => print_transition(&snapshot, images_dir),
                PlayEvent::Finished(result) => return Ok(RoundEnd::Finished(result)),
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(RoundEnd::InputClosed);
                };
                submit(handle, line.trim());
            }
            () = &mut shutdown => return Ok(RoundEnd::Interrupted),
        }
    }
}

fn submit(handle: &RoundHandle, input: &str) {
    if input.is_empty() {
        return;
    }
    let Ok(guess) = input.parse::<Coast>() else {
        println!("Type `w` for West or `e` for East.");
        return;
    };

    match handle.submit_guess(guess) {
        GuessOutcome::Accepted(_) => {}
        GuessOutcome::Ignored(IgnoreReason::FeedbackPending) => {
            println!("(hold on, revealing the last answer)");
        }
        GuessOutcome::Ignored(reason) => {
            tracing::debug!(%reason, "Guess ignored");
        }
    }
}

fn print_prompt(snapshot: &RoundSnapshot, images_dir: &Path) {
    let Some(image) = &snapshot.current_image else {
        return;
    };
    let path: PathBuf = images_dir.join(&image.file);

    println!();
    println!(
        "[{}/{}] Streak: {}",
        snapshot.progress.position + 1,
        snapshot.progress.total,
        snapshot.state.streak
    );
    println!("  Photo: {}", path.display());
    println!("  West or East? ");
}

fn print_transition(snapshot: &RoundSnapshot, images_dir: &Path) {
    if let Some(feedback) = snapshot.feedback() {
        if feedback.is_correct {
            println!("  Correct! That was {}.", feedback.city);
        } else {
            println!("  Wrong! That was {}.", feedback.city);
        }
    } else if snapshot.state.is_awaiting_guess() {
        print_prompt(snapshot, images_dir);
    }
}

fn print_game_over(result: &GameOver) {
    println!();
    println!("Game over");
    println!("  Final score: {}", result.final_score);
    if let Some(city) = &result.offending_city {
        println!("  Missed on: {city}");
    }
    println!("  {}", result.message());
}

// ============================================================================
// seed
// ============================================================================

async fn seed(config: Config) -> anyhow::Result<()> {
    let Some(access_key) = config.seeder.access_key() else {
        println!(
            "{}",
            manual_seeding_instructions(
                &config.seeder.access_key_env,
                &config.manifest,
                &config.images_dir
            )
        );
        return Ok(());
    };

    println!("Coast or Coast - Image Seeder");
    println!("  Manifest: {}", config.manifest);
    println!("  Images directory: {}", config.images_dir);
    println!();

    let client = UnsplashClient::new(&config.seeder.api_base_url, access_key)?;
    let summary = Seeder::from_config(client, &config).run().await?;

    println!();
    println!("{summary}");
    println!("Manifest saved to: {}", config.manifest);
    Ok(())
}
