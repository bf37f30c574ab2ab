pub mod action;
pub mod codec;
pub mod grid;
pub mod persisted;
pub mod placement;
pub mod tile;

pub use action::{DragOrigin, DropTarget, PlacementOp};
pub use codec::{decode, encode};
pub use grid::{
    cell_rects, resolve_grid, resolve_grid_signed, working_size, CellRect, GridError,
    GridGeometry, MAX_SIDE_DEFAULT, MAX_SIDE_FLOOR, RATIO_TOLERANCE,
};
pub use persisted::{
    DEFAULT_VISIBLE_THUMB_COUNT, FALLBACK_PIECE_COUNT, PIECES_KEY, PIECES_WARN_BYTES,
    PLACEMENTS_KEY, VISIBLE_THUMB_COUNT_KEY,
};
pub use placement::{Placement, PlacementChange, PlacementError};
pub use tile::{Tile, TileError, TileSequence};
