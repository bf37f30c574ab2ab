use std::cell::{Cell, RefCell};
use std::rc::Rc;

use kirinuki_core::{
    resolve_grid, GridError, GridGeometry, Placement, PlacementChange, PlacementError,
    PlacementOp, TileSequence,
};
use kirinuki_image_pipeline::PipelineError;
use rand::Rng;

use crate::persisted_store::{KeyValueStore, PuzzleStore, StoreError};
use crate::view::{thumb_size, BoardView};

#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("placement has {found} cells, the board has {expected}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("no tiles to play with")]
    NoTiles,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayEvent {
    PlacementChanged,
    /// The board became solved; fires once until the board is cleared.
    Victory,
}

pub type PlaySubscriber = Rc<dyn Fn(&PlayEvent)>;

/// One play session over a fixed tile sequence.
///
/// All methods take `&self`; the session is single-threaded (`!Sync`) and
/// every placement write goes through [`PlayCore::set_placements`].
pub struct PlayCore<S> {
    store: PuzzleStore<S>,
    tiles: TileSequence,
    grid: GridGeometry,
    victory_shown: Cell<bool>,
    subscribers: Rc<RefCell<Vec<PlaySubscriber>>>,
}

impl<S: KeyValueStore> PlayCore<S> {
    pub fn new(store: PuzzleStore<S>, tiles: TileSequence) -> Result<Self, PlayError> {
        if tiles.is_empty() {
            return Err(PlayError::NoTiles);
        }
        let count = u32::try_from(tiles.len()).map_err(|_| GridError::NonPositiveCount)?;
        let grid = resolve_grid(count)?;
        Ok(Self {
            store,
            tiles,
            grid,
            victory_shown: Cell::new(false),
            subscribers: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub fn count(&self) -> usize {
        self.tiles.len()
    }

    pub fn grid(&self) -> GridGeometry {
        self.grid
    }

    pub fn tiles(&self) -> &TileSequence {
        &self.tiles
    }

    pub fn store(&self) -> &PuzzleStore<S> {
        &self.store
    }

    pub fn victory_shown(&self) -> bool {
        self.victory_shown.get()
    }

    pub fn subscribe(&self, subscriber: PlaySubscriber) -> PlaySubscription {
        self.subscribers.borrow_mut().push(subscriber.clone());
        PlaySubscription {
            subscriber,
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    /// Current placement, reset to all-empty first if its length is stale.
    pub fn placements(&self) -> Result<Placement, PlayError> {
        let placement = self.store.placements();
        if placement.len() == self.count() {
            return Ok(placement);
        }
        tracing::info!(
            stored = placement.len(),
            count = self.count(),
            "re-initializing placements"
        );
        let fresh = Placement::empty(self.count());
        self.set_placements(fresh.clone())?;
        Ok(fresh)
    }

    /// Persists `placement`, then evaluates the solved predicate.
    pub fn set_placements(&self, placement: Placement) -> Result<bool, PlayError> {
        if placement.len() != self.count() {
            return Err(PlayError::LengthMismatch {
                expected: self.count(),
                found: placement.len(),
            });
        }
        self.store.set_placements(&placement)?;
        self.notify(PlayEvent::PlacementChanged);
        Ok(self.check_solved())
    }

    /// Evaluates the persisted placement. Fires [`PlayEvent::Victory`] on the
    /// first solved evaluation; an all-empty board re-arms it.
    pub fn check_solved(&self) -> bool {
        let placement = self.store.placements();
        if placement.is_clear() {
            self.victory_shown.set(false);
        }
        let solved = placement.is_solved(&self.tiles);
        if solved && !self.victory_shown.get() {
            self.victory_shown.set(true);
            tracing::info!(count = self.count(), "puzzle solved");
            self.notify(PlayEvent::Victory);
        }
        solved
    }

    pub fn apply(&self, op: PlacementOp) -> Result<PlacementChange, PlayError> {
        let mut placement = self.placements()?;
        let change = placement.apply(op, &self.tiles)?;
        if change.is_changed() {
            tracing::debug!(?op, "placement changed");
            self.set_placements(placement)?;
        }
        Ok(change)
    }

    pub fn restart(&self) -> Result<(), PlayError> {
        self.set_placements(Placement::empty(self.count()))?;
        Ok(())
    }

    /// Leaves the solved puzzle; the next boot starts from placeholders.
    pub fn finish(self) -> Result<(), PlayError> {
        self.store.clear_puzzle()?;
        Ok(())
    }

    pub fn view<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<BoardView, PlayError> {
        let placement = self.placements()?;
        Ok(BoardView::build(self.grid, &placement, &self.tiles, rng))
    }

    pub fn visible_thumb_count(&self) -> u32 {
        self.store.visible_thumb_count()
    }

    pub fn set_visible_thumb_count(&self, count: u32) -> Result<(), PlayError> {
        self.store.set_visible_thumb_count(count)?;
        Ok(())
    }

    pub fn thumb_size(&self, available_px: u32) -> (u32, u32) {
        thumb_size(available_px, self.visible_thumb_count())
    }

    fn notify(&self, event: PlayEvent) {
        let subscribers = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            (subscriber)(&event);
        }
    }
}

pub struct PlaySubscription {
    subscriber: PlaySubscriber,
    subscribers: Rc<RefCell<Vec<PlaySubscriber>>>,
}

impl Drop for PlaySubscription {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|item| !Rc::ptr_eq(item, &self.subscriber));
    }
}
