use std::collections::HashSet;

use kirinuki_core::{
    cell_rects, resolve_grid, working_size, CellRect, Placement, PlacementOp, Tile, TileSequence,
};
use proptest::prelude::*;

fn overlaps(a: &CellRect, b: &CellRect) -> bool {
    a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.height && b.y < a.y + a.height
}

fn build_tiles(count: usize) -> TileSequence {
    TileSequence::new(
        (0..count)
            .map(|idx| Tile::new("image/png", (idx as u32).to_le_bytes().to_vec()).unwrap())
            .collect(),
    )
}

fn op_strategy(count: usize) -> impl Strategy<Value = PlacementOp> {
    prop_oneof![
        (0..count, 0..count).prop_map(|(tile, cell)| PlacementOp::Place { tile, cell }),
        (0..count, 0..count).prop_map(|(from, to)| PlacementOp::Swap { from, to }),
        (0..count).prop_map(|cell| PlacementOp::Return { cell }),
    ]
}

fn count_and_ops() -> impl Strategy<Value = (usize, Vec<PlacementOp>)> {
    (1usize..=16).prop_flat_map(|count| {
        (
            Just(count),
            proptest::collection::vec(op_strategy(count), 0..64),
        )
    })
}

proptest! {
    #[test]
    fn grid_always_holds_count(count in 1u32..=50) {
        let grid = resolve_grid(count).unwrap();
        prop_assert!(grid.capacity() >= count as usize);
        prop_assert_eq!(grid.cols, (count as f64).sqrt().ceil() as u32);
        prop_assert_eq!(grid.rows, count.div_ceil(grid.cols));
    }

    #[test]
    fn full_grid_tiles_canvas_exactly(
        count in 1u32..=50,
        width in 1u32..=900,
        height in 1u32..=900,
    ) {
        let grid = resolve_grid(count).unwrap();
        prop_assume!(width >= grid.cols && height >= grid.rows);
        let rects = cell_rects(width, height, grid, grid.capacity());
        let area: u64 = rects.iter().map(|rect| rect.area()).sum();
        prop_assert_eq!(area, width as u64 * height as u64);
        for rect in &rects {
            prop_assert!(rect.x + rect.width <= width);
            prop_assert!(rect.y + rect.height <= height);
        }
        // Disjoint, in bounds and summing to the canvas area means an exact cover.
        for (idx, a) in rects.iter().enumerate() {
            prop_assert!(a.width > 0 && a.height > 0);
            for b in &rects[idx + 1..] {
                prop_assert!(!overlaps(a, b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn partial_grid_yields_exactly_count_rects(count in 1u32..=50) {
        let grid = resolve_grid(count).unwrap();
        let rects = cell_rects(1000, 800, grid, count as usize);
        prop_assert_eq!(rects.len(), count as usize);
    }

    #[test]
    fn stretched_working_size_matches_ratio(
        width in 50u32..=5000,
        height in 50u32..=5000,
        count in 1u32..=50,
    ) {
        let grid = resolve_grid(count).unwrap();
        let (w, h) = working_size(width, height, 1200, Some(grid.aspect_ratio()));
        prop_assert!(w.max(h) <= 1200);
        let ratio = w as f64 / h as f64;
        // Rounding to whole pixels bounds the error by one pixel on the short side.
        let slack = 0.01 + grid.aspect_ratio() / (h.min(w) as f64);
        prop_assert!((ratio - grid.aspect_ratio()).abs() <= slack.max(0.02));
    }

    #[test]
    fn operations_keep_tiles_unique((count, ops) in count_and_ops()) {
        let tiles = build_tiles(count);
        let mut placement = Placement::empty(count);
        for op in ops {
            placement.apply(op, &tiles).unwrap();
            prop_assert_eq!(placement.len(), count);

            let placed: Vec<&Tile> = placement.cells().iter().flatten().collect();
            let unique: HashSet<&Tile> = placed.iter().copied().collect();
            prop_assert_eq!(unique.len(), placed.len());

            let tray: HashSet<usize> = placement.unplaced(&tiles).into_iter().collect();
            let expected: HashSet<usize> = (0..count)
                .filter(|idx| !placed.contains(&tiles.get(*idx).unwrap()))
                .collect();
            prop_assert_eq!(&tray, &expected);
            prop_assert_eq!(tray.len() + placed.len(), count);
        }
    }
}
