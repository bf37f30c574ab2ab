pub const PIECES_KEY: &str = "puzzlePieces";
pub const PLACEMENTS_KEY: &str = "puzzlePlacements";
pub const VISIBLE_THUMB_COUNT_KEY: &str = "visibleThumbCount";

/// Board size used when neither the navigation nor the store names one (3x3).
pub const FALLBACK_PIECE_COUNT: usize = 9;
pub const DEFAULT_VISIBLE_THUMB_COUNT: u32 = 8;

/// Serialized piece payloads above this size may not fit a browser origin's quota.
pub const PIECES_WARN_BYTES: usize = 3 * 1024 * 1024;
