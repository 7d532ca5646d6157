mod broadcast;
mod frame_source;

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use kingsight_engine::{Tracker, TrackerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use broadcast::{CsvBroadcast, FenBroadcast};
use frame_source::FrameSource as _;

/// Recovers the sequence of positions being played on a physical chess board
/// from per-frame piece-classification tensors.
#[derive(Parser, Debug)]
struct Args {
    /// Name of the piece-classification model producing the frames. Recorded
    /// in logs; the model itself runs upstream.
    #[arg(default_value = "cnn_onnx_static")]
    algorithm: String,

    /// Directory the game records are written to.
    #[arg(default_value = "game_fens")]
    output_directory: PathBuf,

    /// File of whitespace-separated 8x8x13 probability frames. Reads stdin
    /// when omitted.
    #[arg(short, long)]
    frames: Option<PathBuf>,

    /// FEN of the position the game starts from.
    #[arg(long)]
    start_fen: Option<String>,

    /// Maximum number of hypotheses retained per timestep.
    #[arg(long, default_value_t = 50)]
    breadth: usize,

    /// Seconds an observation must age before its decision is frozen.
    #[arg(long, default_value_t = 5.0)]
    delay: f64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    info!(algorithm = %args.algorithm, output = %args.output_directory.display(), "starting");

    fs::create_dir_all(&args.output_directory).with_context(|| {
        format!("creating output directory {}", args.output_directory.display())
    })?;

    let mut config = TrackerConfig {
        breadth: args.breadth,
        delay: Duration::from_secs_f64(args.delay),
        ..TrackerConfig::default()
    };
    if let Some(fen) = args.start_fen {
        config.start_fen = fen;
    }

    let mut tracker = Tracker::new(config).context("setting up the start position")?;
    let mut source = frame_source::open(args.frames.as_deref())?;
    let mut csv = CsvBroadcast::create(&args.output_directory.join("game_fens.csv"))?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            running.store(false, Ordering::Relaxed);
        })
        .context("installing the Ctrl-C handler")?;
    }

    let started = Instant::now();
    let mut frames = 0u64;
    let mut published = 0usize;

    while running.load(Ordering::Relaxed) {
        let Some(frame) = source.next_frame()? else {
            break;
        };

        tracker.observe(&frame).context("folding in a frame")?;
        frames += 1;

        if tracker.poll() {
            published = publish_new(&tracker, published, &mut csv)?;
        }

        if frames % 100 == 0 {
            info!(frames, "processed");
        }
    }

    // Graceful shutdown: bind whatever is still pending and flush the
    // remaining commitments before writing the final records.
    tracker.finish();
    publish_new(&tracker, published, &mut csv)?;

    let fens = tracker.committed_fens();
    write_game_record(&args.output_directory.join("game_out.txt"), &fens)?;

    info!(
        frames,
        positions = fens.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "finished"
    );
    Ok(())
}

/// Publishes any committed FENs beyond the first `published`, returning the
/// new count.
fn publish_new(
    tracker: &Tracker,
    published: usize,
    broadcast: &mut impl FenBroadcast,
) -> Result<usize> {
    let fens = tracker.committed_fens();
    for fen in &fens[published.min(fens.len())..] {
        info!(%fen, "committed");
        broadcast.publish(fen)?;
    }
    Ok(fens.len())
}

/// Writes the final FEN list followed by a blank line and the PGN section.
fn write_game_record(path: &std::path::Path, fens: &[String]) -> Result<()> {
    let mut file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;

    for fen in fens {
        writeln!(file, "{fen}")?;
    }
    writeln!(file)?;
    writeln!(file, "{}", fens_to_pgn(fens))?;

    Ok(())
}

/// PGN rendering of the committed game. Placeholder: move-list notation is
/// produced by downstream tooling, not this program.
fn fens_to_pgn(_fens: &[String]) -> String {
    String::new()
}
