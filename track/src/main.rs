use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use engine::app::{AppConfig, TickApp, run_app};
use engine::surface::SurfaceSize;
use reveal_track::app::{TrackApp, WINDOW_TITLE};
use reveal_track::clock::{Clock, ManualClock, SystemClock};
use reveal_track::config::TrackConfig;
use reveal_track::layout::TrackAction;
use reveal_track::renderer::{TilePresentation, TrackRenderer, UploadOutcome};
use reveal_track::schedule::parse_instant;
use reveal_track::store::{ImageStore, JsonFileBackend, MemoryBackend};
use reveal_track::upload::UploadTask;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use winit::dpi::PhysicalSize;

#[derive(Debug, Parser)]
#[command(name = "reveal-track")]
#[command(version, about = "A track of tiles that unlock on a schedule")]
struct Cli {
    /// Track configuration (JSON). Falls back to $REVEAL_TRACK_CONFIG, then the bundled track.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Image store file. Falls back to $REVEAL_TRACK_STORE, then the user data directory.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Keep uploaded images in memory only.
    #[arg(long, global = true, default_value_t = false)]
    ephemeral: bool,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the track window (default).
    Run,
    /// Print one render pass.
    List {
        /// Evaluate at this instant instead of now.
        #[arg(long)]
        at: Option<String>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Render one frame to a PNG file without opening a window.
    Snapshot {
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        at: Option<String>,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 480)]
        height: u32,
        /// Open the detail view for this tile id.
        #[arg(long)]
        detail: Option<String>,
    },
    /// Store an image for a revealed tile.
    Upload { id: String, path: PathBuf },
    /// Delete every stored image.
    Reset,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(cli: &Cli) -> ImageStore {
    if cli.ephemeral {
        tracing::info!("using in-memory image store");
        return ImageStore::open(MemoryBackend::new());
    }
    let backend = JsonFileBackend::from_env(cli.store.as_deref());
    tracing::info!(path = %backend.path().display(), "using image store");
    ImageStore::open(backend)
}

fn open_renderer(cli: &Cli) -> Result<(TrackRenderer, TrackConfig)> {
    let config = TrackConfig::resolve(cli.config.as_deref()).context("failed to load track config")?;
    let renderer = TrackRenderer::new(config.clone(), open_store(cli));
    Ok((renderer, config))
}

fn parse_at(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(raw) => parse_instant(raw).with_context(|| format!("unrecognised timestamp {raw:?}")),
        None => Ok(SystemClock.now()),
    }
}

fn print_table(tiles: &[TilePresentation]) {
    println!(
        "{:<12} {:<10} {:<13} {:<22} {}",
        "ID", "RARITY", "STATUS", "REVEALS", "COUNTDOWN"
    );
    for tile in tiles {
        println!(
            "{:<12} {:<10} {:<13} {:<22} {}",
            tile.id,
            tile.rarity_label,
            tile.status_label.as_str(),
            tile.formatted_reveal_instant,
            tile.countdown_text.as_deref().unwrap_or("-"),
        );
    }
}

fn cmd_run(cli: &Cli) -> Result<()> {
    let (renderer, config) = open_renderer(cli)?;
    let now = SystemClock.now();
    match renderer.next_reveal(now) {
        Some((index, at)) => tracing::info!(tile = %renderer.tiles()[index].id, %at, "next reveal"),
        None => tracing::info!("no upcoming reveals"),
    }

    let app = TrackApp::new(renderer, SystemClock);
    let app_config = AppConfig {
        title: WINDOW_TITLE.to_string(),
        desired_size: PhysicalSize::new(1280, 480),
        clamp_to_monitor: true,
        tick_period: config.tick_period(),
    };
    run_app(app_config, app).context("window loop failed")
}

fn cmd_list(cli: &Cli, at: Option<&str>, json: bool) -> Result<()> {
    let (mut renderer, _) = open_renderer(cli)?;
    let now = parse_at(at)?;
    let tiles = renderer.render_pass(now);
    if json {
        println!("{}", serde_json::to_string_pretty(&tiles)?);
    } else {
        print_table(&tiles);
    }
    Ok(())
}

fn cmd_snapshot(
    cli: &Cli,
    out: &Path,
    at: Option<&str>,
    size: SurfaceSize,
    detail: Option<&str>,
) -> Result<()> {
    if size.is_empty() {
        bail!("snapshot size must be non-zero");
    }
    let (renderer, _) = open_renderer(cli)?;
    let detail_index = match detail {
        Some(id) => Some(
            renderer
                .index_of(id)
                .with_context(|| format!("no tile with id {id:?}"))?,
        ),
        None => None,
    };

    let mut app = TrackApp::new(renderer, ManualClock::new(parse_at(at)?));
    app.on_resize(size);
    if let Some(index) = detail_index {
        app.on_action(TrackAction::SelectTile(index));
    }
    let frame = app.snapshot(size);
    let image = image::RgbaImage::from_raw(size.width, size.height, frame.into_pixels())
        .context("frame buffer size mismatch")?;
    image
        .save(out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(path = %out.display(), width = size.width, height = size.height, "snapshot written");
    Ok(())
}

fn cmd_upload(cli: &Cli, id: &str, path: &Path) -> Result<()> {
    let (mut renderer, _) = open_renderer(cli)?;
    let file = UploadTask::spawn(id, path).wait()?;
    match renderer.upload_image(id, file.bytes, SystemClock.now()) {
        UploadOutcome::Stored { persisted: true, .. } => {
            println!("stored image for {id}");
            Ok(())
        }
        UploadOutcome::Stored { persisted: false, .. } => match renderer.take_persist_error() {
            Some(err) => Err(err).with_context(|| format!("image for {id:?} was not saved")),
            None => bail!("image for {id:?} was not saved: image store could not be written"),
        },
        outcome => bail!("upload rejected for tile {id:?}: {outcome:?}"),
    }
}

fn cmd_reset(cli: &Cli) -> Result<()> {
    let (mut renderer, _) = open_renderer(cli)?;
    let count = renderer.store().len();
    renderer
        .reset_images()
        .context("failed to clear image store")?;
    println!("cleared {count} image(s)");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match &cli.command {
        None | Some(Commands::Run) => cmd_run(&cli),
        Some(Commands::List { at, json }) => cmd_list(&cli, at.as_deref(), *json),
        Some(Commands::Snapshot {
            out,
            at,
            width,
            height,
            detail,
        }) => cmd_snapshot(
            &cli,
            out,
            at.as_deref(),
            SurfaceSize::new(*width, *height),
            detail.as_deref(),
        ),
        Some(Commands::Upload { id, path }) => cmd_upload(&cli, id, path),
        Some(Commands::Reset) => cmd_reset(&cli),
    }
}
