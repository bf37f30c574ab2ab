use kirinuki_core::{DragOrigin, PlacementChange};

use crate::app_core::{PlayCore, PlayError};
use crate::input::{
    DropZones, GestureFeedback, GestureInput, GestureOutcome, GestureStart, GestureState,
};
use crate::persisted_store::KeyValueStore;

/// Feeds gestures into a [`PlayCore`], owning the one active gesture.
pub struct PlayController<S> {
    core: PlayCore<S>,
    zones: DropZones,
    gesture: GestureState,
}

impl<S: KeyValueStore> PlayController<S> {
    pub fn new(core: PlayCore<S>, zones: DropZones) -> Self {
        Self {
            core,
            zones,
            gesture: GestureState::Idle,
        }
    }

    pub fn core(&self) -> &PlayCore<S> {
        &self.core
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn feedback(&self) -> GestureFeedback {
        self.gesture.feedback()
    }

    /// Layout changed (resize, thumb setting); an active gesture keeps going.
    pub fn set_zones(&mut self, zones: DropZones) {
        self.zones = zones;
    }

    // Tile the ghost shows, or None when nothing can be picked up there.
    fn pickup_tile(&self, origin: DragOrigin) -> Result<Option<usize>, PlayError> {
        let placement = self.core.placements()?;
        let tiles = self.core.tiles();
        Ok(match origin {
            DragOrigin::Tray { tile } => tiles
                .get(tile)
                .filter(|candidate| !placement.contains(candidate))
                .map(|_| tile),
            DragOrigin::Board { cell } => placement.get(cell).and_then(|tile| tiles.position(tile)),
        })
    }

    fn finish_gesture(&mut self, outcome: GestureOutcome) -> Result<GestureOutcome, PlayError> {
        let Some(op) = outcome.op() else {
            return Ok(outcome);
        };
        match self.core.apply(op)? {
            PlacementChange::Unchanged => tracing::debug!(?op, "gesture left board unchanged"),
            PlacementChange::Changed { returned } => {
                tracing::debug!(?op, returned = returned.len(), "gesture applied")
            }
        }
        Ok(outcome)
    }
}

impl<S: KeyValueStore> GestureInput for PlayController<S> {
    type Error = PlayError;

    fn on_gesture_start(&mut self, start: GestureStart) -> Result<bool, PlayError> {
        if !self.gesture.is_idle() {
            return Ok(false);
        }
        let Some(tile) = self.pickup_tile(start.origin)? else {
            return Ok(false);
        };
        let (next, accepted) = self.gesture.start(start, tile);
        self.gesture = next;
        Ok(accepted)
    }

    fn on_gesture_move(&mut self, pointer_id: i32, x: f32, y: f32) {
        let hover = self.zones.target_at(x, y);
        self.gesture = self.gesture.moved(pointer_id, x, y, hover);
    }

    fn on_gesture_end(
        &mut self,
        pointer_id: i32,
        x: f32,
        y: f32,
    ) -> Result<GestureOutcome, PlayError> {
        let target = self.zones.target_at(x, y);
        let (next, outcome) = std::mem::take(&mut self.gesture).end(pointer_id, target);
        // Transient state is gone before the operation runs.
        self.gesture = next;
        self.finish_gesture(outcome)
    }

    fn on_gesture_cancel(&mut self, pointer_id: i32) {
        let (next, _) = std::mem::take(&mut self.gesture).cancel(pointer_id);
        self.gesture = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{PointerKind, ScreenRect};
    use crate::persisted_store::{MemoryStore, PuzzleStore};
    use kirinuki_core::{DropTarget, Placement, PlacementOp, Tile, TileSequence};

    // 2x2 board of 100px cells at the origin, tray strip below it.
    fn controller() -> PlayController<MemoryStore> {
        let tiles = TileSequence::new(
            (0..4u8)
                .map(|byte| Tile::new("image/png", vec![byte]).unwrap())
                .collect(),
        );
        let core = PlayCore::new(PuzzleStore::new(MemoryStore::new()), tiles).unwrap();
        let zones = DropZones::new(
            ScreenRect::new(0.0, 0.0, 200.0, 200.0),
            core.grid(),
            core.count(),
            ScreenRect::new(0.0, 220.0, 200.0, 60.0),
        );
        PlayController::new(core, zones)
    }

    fn press(origin: DragOrigin, x: f32, y: f32) -> GestureStart {
        GestureStart {
            pointer_id: 7,
            kind: PointerKind::Touch,
            origin,
            x,
            y,
        }
    }

    #[test]
    fn tray_drag_places_tile() {
        let mut ctl = controller();
        assert!(ctl
            .on_gesture_start(press(DragOrigin::Tray { tile: 2 }, 50.0, 250.0))
            .unwrap());
        ctl.on_gesture_move(7, 150.0, 150.0);
        assert_eq!(ctl.feedback().highlight, Some(DropTarget::Cell(3)));
        let outcome = ctl.on_gesture_end(7, 150.0, 150.0).unwrap();
        assert_eq!(outcome.op(), Some(PlacementOp::Place { tile: 2, cell: 3 }));
        assert!(ctl.gesture().is_idle());
        let placement = ctl.core().placements().unwrap();
        assert_eq!(placement.get(3), ctl.core().tiles().get(2));
    }

    #[test]
    fn empty_board_cell_cannot_be_picked_up() {
        let mut ctl = controller();
        assert!(!ctl
            .on_gesture_start(press(DragOrigin::Board { cell: 0 }, 50.0, 50.0))
            .unwrap());
        assert!(ctl.gesture().is_idle());
    }

    #[test]
    fn placed_tile_cannot_be_picked_from_tray() {
        let mut ctl = controller();
        ctl.core()
            .apply(PlacementOp::Place { tile: 1, cell: 0 })
            .unwrap();
        assert!(!ctl
            .on_gesture_start(press(DragOrigin::Tray { tile: 1 }, 50.0, 250.0))
            .unwrap());
    }

    #[test]
    fn tap_on_board_returns_tile() {
        let mut ctl = controller();
        ctl.core()
            .apply(PlacementOp::Place { tile: 0, cell: 1 })
            .unwrap();
        ctl.on_gesture_start(press(DragOrigin::Board { cell: 1 }, 150.0, 50.0))
            .unwrap();
        ctl.on_gesture_move(7, 153.0, 52.0);
        let outcome = ctl.on_gesture_end(7, 153.0, 52.0).unwrap();
        assert!(matches!(outcome, GestureOutcome::Tap(Some(_))));
        assert_eq!(ctl.core().placements().unwrap(), Placement::empty(4));
    }

    #[test]
    fn board_drag_to_tray_returns_and_to_cell_swaps() {
        let mut ctl = controller();
        ctl.core()
            .apply(PlacementOp::Place { tile: 0, cell: 0 })
            .unwrap();
        ctl.on_gesture_start(press(DragOrigin::Board { cell: 0 }, 50.0, 50.0))
            .unwrap();
        ctl.on_gesture_move(7, 150.0, 150.0);
        ctl.on_gesture_end(7, 150.0, 150.0).unwrap();
        let tiles = ctl.core().tiles().clone();
        assert_eq!(ctl.core().placements().unwrap().get(3), tiles.get(0));

        ctl.on_gesture_start(press(DragOrigin::Board { cell: 3 }, 150.0, 150.0))
            .unwrap();
        ctl.on_gesture_move(7, 100.0, 250.0);
        ctl.on_gesture_end(7, 100.0, 250.0).unwrap();
        assert!(ctl.core().placements().unwrap().is_clear());
    }

    #[test]
    fn drop_resolves_against_the_latest_layout() {
        let mut ctl = controller();
        ctl.on_gesture_start(press(DragOrigin::Tray { tile: 2 }, 50.0, 250.0))
            .unwrap();
        // Board slides right mid-drag; the old board area is now empty space.
        ctl.set_zones(DropZones::new(
            ScreenRect::new(300.0, 0.0, 200.0, 200.0),
            ctl.core().grid(),
            ctl.core().count(),
            ScreenRect::new(0.0, 220.0, 200.0, 60.0),
        ));
        ctl.on_gesture_move(7, 50.0, 50.0);
        assert_eq!(ctl.feedback().highlight, None);
        let outcome = ctl.on_gesture_end(7, 350.0, 50.0).unwrap();
        assert_eq!(outcome.op(), Some(PlacementOp::Place { tile: 2, cell: 0 }));
    }

    #[test]
    fn cancel_leaves_board_untouched() {
        let mut ctl = controller();
        ctl.on_gesture_start(press(DragOrigin::Tray { tile: 0 }, 50.0, 250.0))
            .unwrap();
        ctl.on_gesture_move(7, 50.0, 50.0);
        ctl.on_gesture_cancel(7);
        assert!(ctl.gesture().is_idle());
        assert_eq!(ctl.feedback(), GestureFeedback::default());
        assert!(ctl.core().placements().unwrap().is_clear());
    }
}
