use std::fs;
use std::path::Path;

use kirinuki::{ConfigureOutcome, KeyValueStore, PlayCore, PlayError};
use kirinuki_core::TileSequence;
use rand::Rng;

pub fn print_configure(outcome: &ConfigureOutcome) {
    match outcome {
        ConfigureOutcome::Sliced { pieces, .. } => println!("sliced image into {pieces} pieces"),
        ConfigureOutcome::Unsliced { .. } => println!("no image, placeholders will be used"),
        ConfigureOutcome::SliceFailed { message, .. } => {
            println!("could not slice image ({message}), placeholders will be used")
        }
    }
    println!("play?{}", outcome.query());
}

/// Board as a grid of home indices (`.` for empty cells), then the tray.
pub fn print_board<S: KeyValueStore, R: Rng + ?Sized>(
    core: &PlayCore<S>,
    rng: &mut R,
) -> Result<(), PlayError> {
    let view = core.view(rng)?;
    let tiles = core.tiles();
    let width = core.count().to_string().len();
    let cols = view.grid.cols as usize;
    for row in view.cells.chunks(cols) {
        let line: Vec<String> = row
            .iter()
            .map(|cell| match cell.as_ref().and_then(|tile| tiles.position(tile)) {
                Some(home) => format!("{home:>width$}"),
                None => format!("{:>width$}", "."),
            })
            .collect();
        println!("{}", line.join(" "));
    }
    let tray: Vec<String> = view.tray.iter().map(ToString::to_string).collect();
    println!("tray: [{}]", tray.join(", "));
    println!("solved: {}", view.solved);
    Ok(())
}

pub fn export_tiles(tiles: &TileSequence, dir: &Path) -> std::io::Result<usize> {
    fs::create_dir_all(dir)?;
    for (idx, tile) in tiles.iter().enumerate() {
        let ext = match tile.mime() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            other => other.rsplit('/').next().unwrap_or("bin"),
        };
        let name = format!("{idx:03}-{}.{ext}", tile.digest());
        fs::write(dir.join(name), tile.bytes())?;
    }
    Ok(tiles.len())
}
