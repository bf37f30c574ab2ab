mod app_core;
mod boot;
mod configure;
mod controller;
mod file_store;
mod input;
mod persisted_store;
mod view;

pub use app_core::{PlayCore, PlayError, PlayEvent, PlaySubscriber, PlaySubscription};
pub use boot::{boot_play, PlayParams};
pub use configure::{
    commit_configuration, configure_puzzle, ConfigureError, ConfigureOutcome, PuzzleSelection,
    SliceResult, Upload, CONFIGURE_MAX_SIDE,
};
pub use controller::PlayController;
pub use file_store::FileStore;
pub use input::{
    DragSlopGate, DropZones, GestureFeedback, GestureInput, GestureOutcome, GestureStart,
    GestureState, GhostHandle, PointerKind, ScreenRect, MOUSE_DRAG_SLOP_PX, TOUCH_DRAG_SLOP_PX,
};
pub use persisted_store::{KeyValueStore, MemoryStore, PuzzleStore, StoreError};
pub use view::{shuffled_tray, thumb_size, BoardView, THUMB_ASPECT, THUMB_GAP_PX};
