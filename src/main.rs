use tap_timeline::capture::CaptureSession;
use tap_timeline::config::{Configuration, IgnoreSet, DEFAULT_IGNORED_KEYS};
use tap_timeline::console_display;
use tap_timeline::coordinator::{self, SceneFrame};
use tap_timeline::scene_writer;
use tap_timeline::script::{self, ScriptReader};
use tap_timeline::simulator;
use tap_timeline::types::*;

use clap::Parser;
use crossbeam_channel::{bounded, unbounded};
use log::{error, info};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

#[derive(Parser)]
#[command(name = "tap-timeline")]
#[command(about = "Capture tap/key rhythms and draw them on a proportional timeline")]
struct Cli {
    /// Replay a JSONL event script instead of running the simulator
    #[arg(long)]
    script: Option<PathBuf>,

    /// Simulator demo rhythm: "basic", "pickup", or "chords"
    #[arg(long, default_value = "basic")]
    demo: String,

    /// Simulator tempo (BPM)
    #[arg(long, default_value_t = 100.0)]
    tempo: f64,

    /// Notes before the first beat of the grid
    #[arg(long, default_value_t = 0)]
    pickup: i64,

    /// Beats in the analysis grid
    #[arg(long, default_value_t = 4)]
    beats: i64,

    /// Timeline width in pixels (terminal columns with --console)
    #[arg(long, default_value_t = 80)]
    width: u32,

    /// Live redraw rate while a note is held (Hz)
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Key labels that never count as notes (repeatable; replaces the defaults)
    #[arg(long = "ignore")]
    ignore: Vec<String>,

    /// Draw the timeline in the terminal
    #[arg(long)]
    console: bool,

    /// Write scene frames as JSON lines to stdout
    #[arg(long)]
    json: bool,

    /// With --json, also write frames rendered while a note is held
    #[arg(long)]
    json_live: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let cli = Cli::parse();

    let config = match Configuration::new(cli.pickup, cli.beats) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let ignored = if cli.ignore.is_empty() {
        IgnoreSet::default()
    } else {
        IgnoreSet::new(cli.ignore.clone())
    };
    let width = cli.width.max(1);

    // Read the script up front so a bad path fails before any thread starts.
    let scripted = match &cli.script {
        Some(path) => {
            let events = File::open(path)
                .map_err(script::ScriptError::from)
                .and_then(|f| ScriptReader::new(BufReader::new(f)).read_all());
            match events {
                Ok(events) => Some(events),
                Err(e) => {
                    error!("Cannot load script {:?}: {}", path, e);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => None,
    };

    info!("═══════════════════════════════════════════════");
    info!("  TAP TIMELINE v{}", env!("CARGO_PKG_VERSION"));
    match &cli.script {
        Some(path) => info!("  Input: script {:?}", path),
        None => info!("  Input: simulator ({} @ {} bpm)", cli.demo, cli.tempo),
    }
    info!("  Grid: {} pickup note(s), {} beats", config.pickup_notes_count(), config.number_of_beats());
    if cli.ignore.is_empty() {
        info!("  Ignored keys: {}", DEFAULT_IGNORED_KEYS.join(", "));
    } else {
        info!("  Ignored keys: {}", cli.ignore.join(", "));
    }
    info!("═══════════════════════════════════════════════");

    let clock = SessionClock::new();

    // Channel: input source → coordinator
    let (input_tx, input_rx) = bounded::<InputEvent>(1024);

    // Channels: coordinator → consumers
    let mut frame_txs: Vec<crossbeam_channel::Sender<SceneFrame>> = Vec::new();
    let mut handles = Vec::new();

    // ─── Console display ────────────────────────────────────────────
    if cli.console {
        let (tx, rx) = unbounded::<SceneFrame>();
        frame_txs.push(tx);
        let (hz, cols) = (cli.fps, width as usize);
        handles.push(spawn("display", move || {
            console_display::ConsoleDisplay::new(rx, hz, cols).run();
        }));
    }

    // ─── Scene stream ───────────────────────────────────────────────
    if cli.json {
        let (tx, rx) = unbounded::<SceneFrame>();
        frame_txs.push(tx);
        let live = cli.json_live;
        handles.push(spawn("scene-writer", move || {
            scene_writer::SceneWriter::new(rx, io::stdout().lock())
                .with_live_frames(live)
                .run(width as f64, config);
        }));
    }

    // ─── Coordinator ────────────────────────────────────────────────
    let coord_clock = clock.clone();
    let fps = cli.fps;
    let coord_handle = spawn("coordinator", move || {
        let session = CaptureSession::new(config, ignored);
        let finished = coordinator::Coordinator::new(input_rx, frame_txs, session, coord_clock)
            .with_width(width as f64)
            .with_fps(fps)
            .run();
        let summary: Vec<String> = finished.offsets().iter().map(|o| format!("{:.1}", o)).collect();
        info!("Recorded offsets (ms): [{}]", summary.join(", "));
    });

    // ─── Input source ───────────────────────────────────────────────
    // Runs on the main thread; dropping the sender afterwards shuts the pipeline down.
    match scripted {
        Some(events) => {
            script::replay(events, &clock, &input_tx);
        }
        None => {
            simulator::Simulator::new(clock.clone(), input_tx.clone(), cli.tempo).run(&cli.demo);
        }
    }
    drop(input_tx);

    let _ = coord_handle.join();
    for h in handles {
        let _ = h.join();
    }
    ExitCode::SUCCESS
}

fn spawn<F>(name: &str, f: F) -> thread::JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.into())
        .spawn(f)
        .unwrap_or_else(|e| panic!("failed to spawn {} thread: {}", name, e))
}
