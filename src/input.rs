use kirinuki_core::{DragOrigin, DropTarget, GridGeometry, PlacementOp};

pub const TOUCH_DRAG_SLOP_PX: f32 = 8.0;
pub const MOUSE_DRAG_SLOP_PX: f32 = 0.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

impl PointerKind {
    pub fn from_pointer_type(value: &str) -> Self {
        match value {
            "touch" => PointerKind::Touch,
            _ => PointerKind::Mouse,
        }
    }

    /// Movement a press may make before it counts as a drag.
    pub fn drag_slop(self) -> f32 {
        match self {
            PointerKind::Mouse => MOUSE_DRAG_SLOP_PX,
            PointerKind::Touch => TOUCH_DRAG_SLOP_PX,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSlopGate {
    start: [f32; 2],
    slop: f32,
    moved: bool,
}

impl DragSlopGate {
    pub fn new(start_x: f32, start_y: f32, slop: f32) -> Self {
        Self {
            start: [start_x, start_y],
            slop,
            moved: false,
        }
    }

    pub fn update(&mut self, x: f32, y: f32) -> bool {
        if self.moved {
            return true;
        }
        let dx = x - self.start[0];
        let dy = y - self.start[1];
        if dx * dx + dy * dy > self.slop * self.slop {
            self.moved = true;
        }
        self.moved
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureStart {
    pub pointer_id: i32,
    pub kind: PointerKind,
    pub origin: DragOrigin,
    pub x: f32,
    pub y: f32,
}

/// The floating copy of the dragged tile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostHandle {
    pub tile: usize,
    pub x: f32,
    pub y: f32,
}

/// One gesture at a time; a second press while not idle is ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Armed {
        pointer_id: i32,
        origin: DragOrigin,
        ghost_tile: usize,
        gate: DragSlopGate,
    },
    Dragging {
        pointer_id: i32,
        origin: DragOrigin,
        ghost: GhostHandle,
        hover: Option<DropTarget>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Not the active pointer, or nothing in progress.
    Ignored,
    Tap(Option<PlacementOp>),
    Dropped(Option<PlacementOp>),
    Cancelled,
}

impl GestureOutcome {
    pub fn op(self) -> Option<PlacementOp> {
        match self {
            GestureOutcome::Tap(op) | GestureOutcome::Dropped(op) => op,
            GestureOutcome::Ignored | GestureOutcome::Cancelled => None,
        }
    }
}

/// What a renderer draws for the current gesture. The default is a clean board.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureFeedback {
    pub dragging: Option<DragOrigin>,
    pub highlight: Option<DropTarget>,
    pub ghost: Option<GhostHandle>,
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }

    fn pointer_id(&self) -> Option<i32> {
        match self {
            GestureState::Idle => None,
            GestureState::Armed { pointer_id, .. } | GestureState::Dragging { pointer_id, .. } => {
                Some(*pointer_id)
            }
        }
    }

    /// Arms on `start` when idle. `ghost_tile` is the tile the ghost will show.
    pub fn start(self, start: GestureStart, ghost_tile: usize) -> (Self, bool) {
        if !self.is_idle() {
            return (self, false);
        }
        let armed = GestureState::Armed {
            pointer_id: start.pointer_id,
            origin: start.origin,
            ghost_tile,
            gate: DragSlopGate::new(start.x, start.y, start.kind.drag_slop()),
        };
        (armed, true)
    }

    pub fn moved(self, pointer_id: i32, x: f32, y: f32, hover: Option<DropTarget>) -> Self {
        if self.pointer_id() != Some(pointer_id) {
            return self;
        }
        match self {
            GestureState::Armed {
                pointer_id,
                origin,
                ghost_tile,
                mut gate,
            } => {
                if !gate.update(x, y) {
                    return GestureState::Armed {
                        pointer_id,
                        origin,
                        ghost_tile,
                        gate,
                    };
                }
                GestureState::Dragging {
                    pointer_id,
                    origin,
                    ghost: GhostHandle {
                        tile: ghost_tile,
                        x,
                        y,
                    },
                    hover: hover.filter(|target| accepts(origin, *target)),
                }
            }
            GestureState::Dragging {
                pointer_id,
                origin,
                ghost,
                ..
            } => GestureState::Dragging {
                pointer_id,
                origin,
                ghost: GhostHandle { x, y, ..ghost },
                hover: hover.filter(|target| accepts(origin, *target)),
            },
            GestureState::Idle => self,
        }
    }

    /// Releases the gesture. The returned state is always idle unless the
    /// release came from a different pointer.
    pub fn end(self, pointer_id: i32, target: Option<DropTarget>) -> (Self, GestureOutcome) {
        if self.pointer_id() != Some(pointer_id) {
            return (self, GestureOutcome::Ignored);
        }
        let outcome = match self {
            GestureState::Armed { origin, .. } => GestureOutcome::Tap(origin.tap()),
            GestureState::Dragging { origin, .. } => {
                GestureOutcome::Dropped(target.and_then(|target| origin.drop_on(target)))
            }
            GestureState::Idle => GestureOutcome::Ignored,
        };
        (GestureState::Idle, outcome)
    }

    pub fn cancel(self, pointer_id: i32) -> (Self, GestureOutcome) {
        if self.pointer_id() != Some(pointer_id) {
            return (self, GestureOutcome::Ignored);
        }
        (GestureState::Idle, GestureOutcome::Cancelled)
    }

    pub fn feedback(&self) -> GestureFeedback {
        match self {
            GestureState::Dragging {
                origin,
                ghost,
                hover,
                ..
            } => GestureFeedback {
                dragging: Some(*origin),
                highlight: *hover,
                ghost: Some(*ghost),
            },
            GestureState::Idle | GestureState::Armed { .. } => GestureFeedback::default(),
        }
    }
}

fn accepts(origin: DragOrigin, target: DropTarget) -> bool {
    origin.drop_on(target).is_some()
}

/// Input capability the play screen drives, whatever the device.
///
/// Implementations return to idle on end and cancel even when applying the
/// resulting operation fails.
pub trait GestureInput {
    type Error;

    /// Returns whether the gesture was accepted.
    fn on_gesture_start(&mut self, start: GestureStart) -> Result<bool, Self::Error>;
    fn on_gesture_move(&mut self, pointer_id: i32, x: f32, y: f32);
    fn on_gesture_end(
        &mut self,
        pointer_id: i32,
        x: f32,
        y: f32,
    ) -> Result<GestureOutcome, Self::Error>;
    fn on_gesture_cancel(&mut self, pointer_id: i32);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Screen layout of the board and the tray, for resolving drop targets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropZones {
    board: ScreenRect,
    grid: GridGeometry,
    count: usize,
    tray: ScreenRect,
}

impl DropZones {
    pub fn new(board: ScreenRect, grid: GridGeometry, count: usize, tray: ScreenRect) -> Self {
        Self {
            board,
            grid,
            count,
            tray,
        }
    }

    pub fn target_at(&self, x: f32, y: f32) -> Option<DropTarget> {
        if self.board.contains(x, y) {
            return self.cell_at(x, y).map(DropTarget::Cell);
        }
        self.tray.contains(x, y).then_some(DropTarget::Tray)
    }

    pub fn cell_rect(&self, cell: usize) -> Option<ScreenRect> {
        if cell >= self.count {
            return None;
        }
        let (col, row) = self.grid.cell_coords(cell);
        let (cell_w, cell_h) = self.cell_size();
        Some(ScreenRect::new(
            self.board.x + col as f32 * cell_w,
            self.board.y + row as f32 * cell_h,
            cell_w,
            cell_h,
        ))
    }

    fn cell_size(&self) -> (f32, f32) {
        (
            self.board.width / self.grid.cols as f32,
            self.board.height / self.grid.rows as f32,
        )
    }

    fn cell_at(&self, x: f32, y: f32) -> Option<usize> {
        let (cell_w, cell_h) = self.cell_size();
        let col = (((x - self.board.x) / cell_w) as u32).min(self.grid.cols - 1);
        let row = (((y - self.board.y) / cell_h) as u32).min(self.grid.rows - 1);
        let cell = self.grid.cell_index(col, row);
        (cell < self.count).then_some(cell)
    }
}
