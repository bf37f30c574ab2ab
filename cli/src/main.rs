use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use kirinuki::{
    boot_play, commit_configuration, FileStore, PlayCore, PlayEvent, PlayParams, PuzzleSelection,
    PuzzleStore, SliceResult, Upload,
};
use kirinuki_core::PlacementOp;
use kirinuki_image_pipeline::ImageSlicer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

mod report;

#[derive(Parser)]
#[command(name = "kirinuki", version, about = "Slice images into grid puzzles and play them")]
struct Cli {
    /// JSON file holding the persisted puzzle keys.
    #[arg(long, global = true, env = "KIRINUKI_STORE", default_value = "kirinuki-store.json")]
    store: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PlayArgs {
    /// Requested piece count, as carried by the play page's `size` parameter.
    #[arg(long)]
    size: Option<usize>,
    /// Seed for the tray shuffle.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new puzzle, optionally slicing an image.
    Configure {
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
        /// Media type of the image; sniffed from its bytes when omitted.
        #[arg(long)]
        mime: Option<String>,
    },
    Status {
        #[command(flatten)]
        play: PlayArgs,
    },
    /// Put a tray tile on a board cell.
    Place {
        #[arg(long)]
        tile: usize,
        #[arg(long)]
        cell: usize,
        #[command(flatten)]
        play: PlayArgs,
    },
    Swap {
        #[arg(long)]
        from: usize,
        #[arg(long)]
        to: usize,
        #[command(flatten)]
        play: PlayArgs,
    },
    /// Send a board tile back to the tray.
    Return {
        #[arg(long)]
        cell: usize,
        #[command(flatten)]
        play: PlayArgs,
    },
    Restart {
        #[command(flatten)]
        play: PlayArgs,
    },
    /// Leave the current puzzle; the next session starts from placeholders.
    Finish {
        #[command(flatten)]
        play: PlayArgs,
    },
    /// Write every tile of the current puzzle to a directory.
    Export {
        #[arg(long)]
        dir: PathBuf,
        #[command(flatten)]
        play: PlayArgs,
    },
    Settings {
        /// Thumbs visible in the tray at once.
        #[arg(long)]
        visible: Option<u32>,
        /// Tray width in pixels, to report the thumb size.
        #[arg(long, default_value_t = 856)]
        width: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(path = %cli.store.display(), "opening store");
    let store = PuzzleStore::new(FileStore::open(&cli.store)?);

    match cli.command {
        Commands::Configure {
            difficulty,
            size,
            image,
            mime,
        } => {
            let selection = PuzzleSelection::parse(difficulty.as_deref(), size.as_deref())?;
            let result = match image {
                Some(path) => slice_upload(&path, mime, &selection).await?,
                None => SliceResult::NoImage,
            };
            let outcome = commit_configuration(&store, &selection, result)?;
            report::print_configure(&outcome);
        }
        Commands::Status { play } => {
            let core = boot(store, &play)?;
            report::print_board(&core, &mut rng_for(&play))?;
        }
        Commands::Place { tile, cell, play } => {
            run_op(store, &play, PlacementOp::Place { tile, cell })?;
        }
        Commands::Swap { from, to, play } => {
            run_op(store, &play, PlacementOp::Swap { from, to })?;
        }
        Commands::Return { cell, play } => {
            run_op(store, &play, PlacementOp::Return { cell })?;
        }
        Commands::Restart { play } => {
            let core = boot(store, &play)?;
            core.restart()?;
            report::print_board(&core, &mut rng_for(&play))?;
        }
        Commands::Finish { play } => {
            boot(store, &play)?.finish()?;
            println!("puzzle cleared");
        }
        Commands::Export { dir, play } => {
            let core = boot(store, &play)?;
            let written = report::export_tiles(core.tiles(), &dir)?;
            println!("wrote {written} tiles to {}", dir.display());
        }
        Commands::Settings { visible, width } => {
            if let Some(visible) = visible {
                store.set_visible_thumb_count(visible)?;
            }
            let count = store.visible_thumb_count();
            let (thumb_w, thumb_h) = kirinuki::thumb_size(width, count);
            println!("visible thumbs: {count} ({thumb_w}x{thumb_h}px at {width}px)");
        }
    }

    Ok(())
}

async fn slice_upload(
    path: &Path,
    mime: Option<String>,
    selection: &PuzzleSelection,
) -> Result<SliceResult, Box<dyn std::error::Error>> {
    let upload = Upload {
        bytes: std::fs::read(path)?,
        mime,
    };
    let notice = upload.validate()?;
    eprintln!("{}", notice.message());
    let slicer = ImageSlicer::new(selection.slice_config()?);
    let count = selection.size;
    let sliced = tokio::task::spawn_blocking(move || slicer.slice(&upload.bytes, count)).await?;
    Ok(match sliced {
        Ok(tiles) => SliceResult::Sliced { tiles, notice },
        Err(err) => SliceResult::Failed(err),
    })
}

fn boot(
    store: PuzzleStore<FileStore>,
    play: &PlayArgs,
) -> Result<PlayCore<FileStore>, kirinuki::PlayError> {
    let params = PlayParams {
        difficulty: None,
        size: play.size,
    };
    boot_play(store, &params)
}

fn rng_for(play: &PlayArgs) -> StdRng {
    match play.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn run_op(
    store: PuzzleStore<FileStore>,
    play: &PlayArgs,
    op: PlacementOp,
) -> Result<(), Box<dyn std::error::Error>> {
    let core = boot(store, play)?;
    let solved = Rc::new(Cell::new(false));
    let flag = Rc::clone(&solved);
    let _victory = core.subscribe(Rc::new(move |event: &PlayEvent| {
        if *event == PlayEvent::Victory {
            flag.set(true);
        }
    }));
    let change = core.apply(op)?;
    if !change.is_changed() {
        println!("nothing to do");
    }
    report::print_board(&core, &mut rng_for(play))?;
    if solved.get() {
        println!("puzzle solved!");
    }
    Ok(())
}
