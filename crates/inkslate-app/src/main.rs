//! Inkslate command-line host.
//!
//! `inkslate render` turns a stored board into a PNG; `inkslate replay` runs a
//! gesture script against a board in a storage directory, headlessly.

mod script;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inkslate_core::storage::{AllowAll, FileStorage, PersistenceGateway};
use inkslate_core::{BoardSession, Canvas, CanvasDocument, EditorConfig, LiveSync};
use inkslate_render::PngThumbnailer;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long replay waits for the stored board before giving up.
const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "inkslate", version, about = "Headless whiteboard engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a board file (a JSON array of shape records) to PNG.
    Render {
        board: PathBuf,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long, default_value_t = 640)]
        width: u32,
        #[arg(long, default_value_t = 360)]
        height: u32,
    },
    /// Replay a gesture script against a stored board.
    Replay {
        #[arg(long)]
        board: String,
        /// Board directory; defaults to the per-user data directory.
        #[arg(long)]
        storage_dir: Option<PathBuf>,
        #[arg(long)]
        script: PathBuf,
        /// Editor configuration (JSON).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Live-sync server to publish edits to, e.g. `ws://localhost:3030/ws/<board>`.
        #[arg(long)]
        live: Option<String>,
        /// Write the final thumbnail here as well as into storage.
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Command::Render {
            board,
            out,
            width,
            height,
        } => render(&board, &out, width, height),
        Command::Replay {
            board,
            storage_dir,
            script,
            config,
            live,
            thumbnail,
        } => replay(ReplayOptions {
            board,
            storage_dir,
            script,
            config,
            live,
            thumbnail,
        }),
    }
}

fn render(board: &Path, out: &Path, width: u32, height: u32) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(board).with_context(|| format!("reading {}", board.display()))?;
    let document = CanvasDocument::from_json(&json).with_context(|| format!("parsing {}", board.display()))?;
    write_thumbnail(&document, out, width, height)?;
    log::info!("Rendered {} shapes to {}", document.len(), out.display());
    Ok(())
}

fn write_thumbnail(document: &CanvasDocument, out: &Path, width: u32, height: u32) -> anyhow::Result<()> {
    let png = PngThumbnailer::new()
        .render(document.shapes(), width, height)?
        .encode_png()?;
    std::fs::write(out, png).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}

struct ReplayOptions {
    board: String,
    storage_dir: Option<PathBuf>,
    script: PathBuf,
    config: Option<PathBuf>,
    live: Option<String>,
    thumbnail: Option<PathBuf>,
}

fn replay(options: ReplayOptions) -> anyhow::Result<()> {
    let config = match &options.config {
        Some(path) => EditorConfig::from_json_file(path)?,
        None => EditorConfig::default(),
    };
    let events = script::load_script(&options.script)
        .with_context(|| format!("loading script {}", options.script.display()))?;
    let storage = match options.storage_dir {
        Some(dir) => FileStorage::new(dir)?,
        None => FileStorage::default_location()?,
    };
    log::info!("Boards in {}", storage.base_path().display());

    let (thumb_width, thumb_height) = (config.thumbnail_width, config.thumbnail_height);
    let gateway = PersistenceGateway::spawn(
        Arc::new(storage),
        Arc::new(AllowAll),
        Some(Box::new(PngThumbnailer::new())),
    );
    let mut session = BoardSession::open(options.board.clone(), Canvas::new(config), gateway);
    if let Some(url) = &options.live {
        let mut live = LiveSync::new(options.board.clone());
        live.connect(url)?;
        session = session.with_live_sync(live);
    }

    let started = Instant::now();
    while !session.is_loaded() {
        if started.elapsed() > LOAD_TIMEOUT {
            bail!("timed out loading board {}", options.board);
        }
        session.tick(Instant::now());
        std::thread::sleep(Duration::from_millis(5));
    }
    log::info!(
        "Loaded board {} ({} shapes)",
        options.board,
        session.canvas().document.len()
    );

    // Script time runs on a virtual clock so `wait` events exercise the
    // debounce and thumbnail throttle without sleeping.
    let mut now = Instant::now();
    let mut repaints = 0usize;
    for event in &events {
        now += event.apply(session.canvas_mut());
        if session.tick(now) {
            repaints += 1;
        }
    }
    session.flush(now);
    log::info!("Replayed {} events, {} repaints", events.len(), repaints);

    let canvas = session.close();
    if let Some(out) = &options.thumbnail {
        write_thumbnail(&canvas.document, out, thumb_width, thumb_height)?;
        log::info!("Thumbnail written to {}", out.display());
    }
    println!("{} shapes on board {}", canvas.document.len(), options.board);
    Ok(())
}
