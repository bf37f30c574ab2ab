use kirinuki_core::{GridGeometry, Placement, Tile, TileSequence};
use rand::seq::SliceRandom;
use rand::Rng;

pub const THUMB_GAP_PX: u32 = 8;
pub const THUMB_ASPECT: f64 = 0.66;

/// Everything a renderer needs for one frame, rebuilt from placement and tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardView {
    pub grid: GridGeometry,
    pub cells: Vec<Option<Tile>>,
    /// Tile indices of the tray, in display order.
    pub tray: Vec<usize>,
    pub solved: bool,
}

impl BoardView {
    pub fn build<R: Rng + ?Sized>(
        grid: GridGeometry,
        placement: &Placement,
        tiles: &TileSequence,
        rng: &mut R,
    ) -> Self {
        Self {
            grid,
            cells: placement.cells().to_vec(),
            tray: shuffled_tray(placement, tiles, rng),
            solved: placement.is_solved(tiles),
        }
    }

    /// Index of the tile occupying `cell`, if any.
    pub fn tile_at(&self, cell: usize, tiles: &TileSequence) -> Option<usize> {
        self.cells
            .get(cell)
            .and_then(Option::as_ref)
            .and_then(|tile| tiles.position(tile))
    }
}

/// Unplaced tile indices in a fresh uniform permutation.
pub fn shuffled_tray<R: Rng + ?Sized>(
    placement: &Placement,
    tiles: &TileSequence,
    rng: &mut R,
) -> Vec<usize> {
    let mut tray = placement.unplaced(tiles);
    tray.shuffle(rng);
    tray
}

/// Thumb size that fits `visible` thumbs with gaps into `available_px`.
pub fn thumb_size(available_px: u32, visible: u32) -> (u32, u32) {
    let visible = visible.max(1);
    let gaps = (visible - 1).saturating_mul(THUMB_GAP_PX);
    let width = available_px.saturating_sub(gaps) / visible;
    let height = (width as f64 * THUMB_ASPECT).round() as u32;
    (width, height)
}
