use serde::{Deserialize, Serialize};

/// Aspect ratios closer than this are treated as equal when stretching.
pub const RATIO_TOLERANCE: f64 = 0.01;
/// Lower bound applied to any requested maximum working side.
pub const MAX_SIDE_FLOOR: u32 = 400;
pub const MAX_SIDE_DEFAULT: u32 = 1400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("piece count must be a positive integer")]
    NonPositiveCount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridGeometry {
    pub cols: u32,
    pub rows: u32,
}

impl GridGeometry {
    pub fn capacity(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.cols as f64 / self.rows as f64
    }

    pub fn cell_index(&self, col: u32, row: u32) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    pub fn cell_coords(&self, idx: usize) -> (u32, u32) {
        let cols = self.cols as usize;
        ((idx % cols) as u32, (idx / cols) as u32)
    }
}

/// Lays `count` cells out on the most square grid that holds them.
///
/// `cols = ceil(sqrt(count))`, `rows = ceil(count / cols)`. The last row may be
/// under-filled; cells at index `>= count` are never used.
pub fn resolve_grid(count: u32) -> Result<GridGeometry, GridError> {
    if count == 0 {
        return Err(GridError::NonPositiveCount);
    }
    let mut cols = (count as f64).sqrt().ceil() as u32;
    // f64 sqrt can land one off for very large perfect squares.
    while cols > 1 && (cols - 1) * (cols - 1) >= count {
        cols -= 1;
    }
    while cols.saturating_mul(cols) < count {
        cols += 1;
    }
    let rows = count.div_ceil(cols);
    Ok(GridGeometry { cols, rows })
}

/// Resolves a count coming from a signed source such as a query parameter.
pub fn resolve_grid_signed(count: i64) -> Result<GridGeometry, GridError> {
    let count = u32::try_from(count).map_err(|_| GridError::NonPositiveCount)?;
    resolve_grid(count)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Source rectangles of the first `count` cells of a `width x height` canvas, row-major.
///
/// Interior cells are `floor(width / cols)` by `floor(height / rows)`; the last
/// column and the last row absorb the remainder so a full grid covers the
/// canvas exactly.
pub fn cell_rects(width: u32, height: u32, grid: GridGeometry, count: usize) -> Vec<CellRect> {
    let tile_w = width / grid.cols;
    let tile_h = height / grid.rows;
    let count = count.min(grid.capacity());
    let mut rects = Vec::with_capacity(count);
    'rows: for row in 0..grid.rows {
        for col in 0..grid.cols {
            if rects.len() >= count {
                break 'rows;
            }
            let x = col * tile_w;
            let y = row * tile_h;
            let w = if col == grid.cols - 1 { width - x } else { tile_w };
            let h = if row == grid.rows - 1 { height - y } else { tile_h };
            rects.push(CellRect {
                x,
                y,
                width: w,
                height: h,
            });
        }
    }
    rects
}

/// Size of the single working canvas a source image is resampled into before slicing.
///
/// The source is scaled down (never up) so its longer side fits `max_side`.
/// With `target_ratio` set, the side that has to shrink is adjusted until the
/// aspect ratio matches (a non-uniform stretch, nothing is cropped), then both
/// sides are scaled down again if the stretch overshot `max_side`.
pub fn working_size(
    width: u32,
    height: u32,
    max_side: u32,
    target_ratio: Option<f64>,
) -> (u32, u32) {
    let max_side = max_side.max(MAX_SIDE_FLOOR);
    let width = width.max(1);
    let height = height.max(1);
    let base_scale = (max_side as f64 / width.max(height) as f64).min(1.0);
    let mut target_w = round_dim(width as f64 * base_scale);
    let mut target_h = round_dim(height as f64 * base_scale);

    if let Some(ratio) = target_ratio.filter(|ratio| ratio.is_finite() && *ratio > 0.0) {
        let current = target_w as f64 / target_h as f64;
        if (current - ratio).abs() > RATIO_TOLERANCE {
            if current > ratio {
                target_w = round_dim(target_h as f64 * ratio);
            } else {
                target_h = round_dim(target_w as f64 / ratio);
            }
        }
    }

    let post_max = target_w.max(target_h);
    if post_max > max_side {
        let adjust = max_side as f64 / post_max as f64;
        target_w = round_dim(target_w as f64 * adjust);
        target_h = round_dim(target_h as f64 * adjust);
    }
    (target_w, target_h)
}

fn round_dim(value: f64) -> u32 {
    value.round().max(1.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_small_counts() {
        assert_eq!(resolve_grid(1), Ok(GridGeometry { cols: 1, rows: 1 }));
        assert_eq!(resolve_grid(2), Ok(GridGeometry { cols: 2, rows: 1 }));
        assert_eq!(resolve_grid(5), Ok(GridGeometry { cols: 3, rows: 2 }));
        assert_eq!(resolve_grid(9), Ok(GridGeometry { cols: 3, rows: 3 }));
        assert_eq!(resolve_grid(10), Ok(GridGeometry { cols: 4, rows: 3 }));
        assert_eq!(resolve_grid(0), Err(GridError::NonPositiveCount));
        assert_eq!(resolve_grid_signed(-4), Err(GridError::NonPositiveCount));
    }

    #[test]
    fn cell_index_round_trips_coords() {
        let grid = resolve_grid(12).unwrap();
        for idx in 0..12 {
            let (col, row) = grid.cell_coords(idx);
            assert_eq!(grid.cell_index(col, row), idx);
        }
    }

    #[test]
    fn last_row_and_column_absorb_remainder() {
        let grid = GridGeometry { cols: 3, rows: 2 };
        let rects = cell_rects(100, 51, grid, 6);
        assert_eq!(rects[0], CellRect { x: 0, y: 0, width: 33, height: 25 });
        assert_eq!(rects[2], CellRect { x: 66, y: 0, width: 34, height: 25 });
        assert_eq!(rects[5], CellRect { x: 66, y: 25, width: 34, height: 26 });
    }

    #[test]
    fn under_filled_grid_only_yields_count_rects() {
        let grid = resolve_grid(5).unwrap();
        let rects = cell_rects(300, 200, grid, 5);
        assert_eq!(rects.len(), 5);
        assert_eq!(rects[4].y, 100);
    }

    #[test]
    fn working_size_never_upscales() {
        assert_eq!(working_size(300, 300, 1400, None), (300, 300));
        assert_eq!(working_size(2800, 1400, 1400, None), (1400, 700));
    }

    #[test]
    fn working_size_clamps_max_side_floor() {
        assert_eq!(working_size(1000, 1000, 100, None), (400, 400));
    }

    #[test]
    fn working_size_stretches_to_ratio() {
        // 2:1 source onto a square grid: width shrinks.
        assert_eq!(working_size(800, 400, 1400, Some(1.0)), (400, 400));
        // 1:2 source onto a 3:2 grid: height shrinks.
        assert_eq!(working_size(400, 800, 1400, Some(1.5)), (400, 267));
    }

    #[test]
    fn working_size_ignores_ratio_within_tolerance() {
        assert_eq!(working_size(1005, 1000, 1400, Some(1.0)), (1005, 1000));
    }

    #[test]
    fn working_size_rejects_degenerate_ratio() {
        assert_eq!(working_size(800, 400, 1400, Some(0.0)), (800, 400));
        assert_eq!(working_size(800, 400, 1400, Some(f64::NAN)), (800, 400));
    }
}
