use serde::{Deserialize, Serialize};

/// The three board mutations every gesture is reduced to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementOp {
    /// Put tile `tile` (index into the tile sequence) on `cell`, evicting any occupant to the tray.
    Place { tile: usize, cell: usize },
    Swap { from: usize, to: usize },
    /// Clear `cell`, sending its tile back to the tray.
    Return { cell: usize },
}

/// Where a drag began.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragOrigin {
    Tray { tile: usize },
    Board { cell: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropTarget {
    Cell(usize),
    Tray,
}

impl DragOrigin {
    /// The operation a drop on `target` resolves to, if any.
    pub fn drop_on(self, target: DropTarget) -> Option<PlacementOp> {
        match (self, target) {
            (DragOrigin::Tray { tile }, DropTarget::Cell(cell)) => {
                Some(PlacementOp::Place { tile, cell })
            }
            (DragOrigin::Board { cell }, DropTarget::Cell(to)) if cell != to => {
                Some(PlacementOp::Swap { from: cell, to })
            }
            (DragOrigin::Board { cell }, DropTarget::Tray) => Some(PlacementOp::Return { cell }),
            _ => None,
        }
    }

    /// The operation a tap (press and release without a drag) resolves to.
    pub fn tap(self) -> Option<PlacementOp> {
        match self {
            DragOrigin::Board { cell } => Some(PlacementOp::Return { cell }),
            DragOrigin::Tray { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_resolve_by_origin() {
        let tray = DragOrigin::Tray { tile: 3 };
        let board = DragOrigin::Board { cell: 1 };
        assert_eq!(
            tray.drop_on(DropTarget::Cell(0)),
            Some(PlacementOp::Place { tile: 3, cell: 0 })
        );
        assert_eq!(tray.drop_on(DropTarget::Tray), None);
        assert_eq!(
            board.drop_on(DropTarget::Cell(4)),
            Some(PlacementOp::Swap { from: 1, to: 4 })
        );
        assert_eq!(board.drop_on(DropTarget::Cell(1)), None);
        assert_eq!(
            board.drop_on(DropTarget::Tray),
            Some(PlacementOp::Return { cell: 1 })
        );
    }

    #[test]
    fn taps_only_return_board_tiles() {
        assert_eq!(
            DragOrigin::Board { cell: 2 }.tap(),
            Some(PlacementOp::Return { cell: 2 })
        );
        assert_eq!(DragOrigin::Tray { tile: 0 }.tap(), None);
    }
}
