use serde::{Deserialize, Serialize};

use crate::action::PlacementOp;
use crate::tile::{Tile, TileSequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("cell {cell} is outside the board of {len} cells")]
    CellOutOfRange { cell: usize, len: usize },
    #[error("tile {tile} is outside the sequence of {len} tiles")]
    TileOutOfRange { tile: usize, len: usize },
}

/// What a mutation did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementChange {
    Unchanged,
    Changed {
        /// Tiles that left the board and are back in the tray.
        returned: Vec<Tile>,
    },
}

impl PlacementChange {
    pub fn is_changed(&self) -> bool {
        matches!(self, PlacementChange::Changed { .. })
    }
}

/// Current occupancy of every board cell.
///
/// A tile occupies at most one cell; tiles on no cell are in the tray.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Option<Tile>>", into = "Vec<Option<Tile>>")]
pub struct Placement {
    cells: Vec<Option<Tile>>,
}

impl Placement {
    pub fn empty(len: usize) -> Self {
        Self {
            cells: vec![None; len],
        }
    }

    /// Builds a placement from stored cells, dropping repeated tiles after their first cell.
    pub fn from_cells(cells: Vec<Option<Tile>>) -> Self {
        let mut placement = Self { cells };
        placement.dedup();
        placement
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Option<Tile>] {
        &self.cells
    }

    pub fn get(&self, cell: usize) -> Option<&Tile> {
        self.cells.get(cell).and_then(Option::as_ref)
    }

    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    pub fn is_clear(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn contains(&self, tile: &Tile) -> bool {
        self.cell_of(tile).is_some()
    }

    pub fn cell_of(&self, tile: &Tile) -> Option<usize> {
        self.cells
            .iter()
            .position(|cell| cell.as_ref() == Some(tile))
    }

    pub fn apply(
        &mut self,
        op: PlacementOp,
        tiles: &TileSequence,
    ) -> Result<PlacementChange, PlacementError> {
        match op {
            PlacementOp::Place { tile, cell } => {
                let tile = tiles.get(tile).ok_or(PlacementError::TileOutOfRange {
                    tile,
                    len: tiles.len(),
                })?;
                self.place(tile.clone(), cell)
            }
            PlacementOp::Swap { from, to } => self.swap(from, to),
            PlacementOp::Return { cell } => self.take(cell).map(|taken| match taken {
                Some(tile) => PlacementChange::Changed {
                    returned: vec![tile],
                },
                None => PlacementChange::Unchanged,
            }),
        }
    }

    /// Occupies `cell` with `tile`. The previous occupant goes back to the tray,
    /// and so does any other cell already holding `tile`.
    pub fn place(&mut self, tile: Tile, cell: usize) -> Result<PlacementChange, PlacementError> {
        self.check_cell(cell)?;
        if self.cells[cell].as_ref() == Some(&tile) {
            return Ok(PlacementChange::Unchanged);
        }
        if let Some(previous) = self.cell_of(&tile) {
            self.cells[previous] = None;
        }
        let returned = self.cells[cell].replace(tile).into_iter().collect();
        Ok(PlacementChange::Changed { returned })
    }

    pub fn swap(&mut self, from: usize, to: usize) -> Result<PlacementChange, PlacementError> {
        self.check_cell(from)?;
        self.check_cell(to)?;
        if from == to || self.cells[from] == self.cells[to] {
            return Ok(PlacementChange::Unchanged);
        }
        self.cells.swap(from, to);
        Ok(PlacementChange::Changed {
            returned: Vec::new(),
        })
    }

    pub fn take(&mut self, cell: usize) -> Result<Option<Tile>, PlacementError> {
        self.check_cell(cell)?;
        Ok(self.cells[cell].take())
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = None);
    }

    /// Every cell holds the tile whose home it is.
    pub fn is_solved(&self, tiles: &TileSequence) -> bool {
        !tiles.is_empty()
            && self.cells.len() == tiles.len()
            && self
                .cells
                .iter()
                .zip(tiles)
                .all(|(cell, home)| cell.as_ref() == Some(home))
    }

    /// Indices into `tiles` of every tile not on the board, in sequence order.
    pub fn unplaced(&self, tiles: &TileSequence) -> Vec<usize> {
        tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| !self.contains(tile))
            .map(|(idx, _)| idx)
            .collect()
    }

    fn check_cell(&self, cell: usize) -> Result<(), PlacementError> {
        if cell >= self.cells.len() {
            return Err(PlacementError::CellOutOfRange {
                cell,
                len: self.cells.len(),
            });
        }
        Ok(())
    }

    fn dedup(&mut self) {
        for idx in 1..self.cells.len() {
            let Some(tile) = self.cells[idx].as_ref() else {
                continue;
            };
            if self.cells[..idx].iter().any(|cell| cell.as_ref() == Some(tile)) {
                self.cells[idx] = None;
            }
        }
    }
}

impl From<Vec<Option<Tile>>> for Placement {
    fn from(cells: Vec<Option<Tile>>) -> Self {
        Self::from_cells(cells)
    }
}

impl From<Placement> for Vec<Option<Tile>> {
    fn from(placement: Placement) -> Self {
        placement.cells
    }
}
