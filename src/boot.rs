use kirinuki_core::{TileSequence, FALLBACK_PIECE_COUNT};
use kirinuki_image_pipeline::placeholder_tiles;
use url::form_urlencoded;

use crate::app_core::{PlayCore, PlayError};
use crate::persisted_store::{KeyValueStore, PuzzleStore};

/// Query parameters the configuration page hands to the play page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayParams {
    pub difficulty: Option<String>,
    pub size: Option<usize>,
}

impl PlayParams {
    pub fn new(difficulty: impl Into<String>, size: usize) -> Self {
        Self {
            difficulty: Some(difficulty.into()),
            size: Some(size),
        }
    }

    /// Parses `difficulty=..&size=..`, with or without a leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "difficulty" => params.difficulty = Some(value.into_owned()),
                "size" => params.size = leading_int(&value),
                _ => {}
            }
        }
        params
    }

    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(difficulty) = &self.difficulty {
            out.append_pair("difficulty", difficulty);
        }
        if let Some(size) = self.size {
            out.append_pair("size", &size.to_string());
        }
        out.finish()
    }

    /// Requested piece count, if positive.
    pub fn requested(&self) -> Option<usize> {
        self.size.filter(|size| *size > 0)
    }
}

/// Leading decimal digits of `value`; `"12abc"` reads as 12.
pub(crate) fn leading_int(value: &str) -> Option<usize> {
    let trimmed = value.trim_start();
    let digits = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .map_or(trimmed, |end| &trimmed[..end]);
    digits.parse().ok()
}

/// Reconciles the requested size with stored pieces and opens a session.
///
/// With no stored pieces, placeholders are generated and persisted. Otherwise
/// the stored sequence decides the piece count.
pub fn boot_play<S: KeyValueStore>(
    store: PuzzleStore<S>,
    params: &PlayParams,
) -> Result<PlayCore<S>, PlayError> {
    let stored = store.pieces();
    tracing::debug!(pieces = stored.len(), "loaded stored pieces");
    let target = params
        .requested()
        .or_else(|| (!stored.is_empty()).then_some(stored.len()))
        .unwrap_or(FALLBACK_PIECE_COUNT);

    let tiles = if stored.is_empty() {
        tracing::info!(count = target, "no stored pieces, generating placeholders");
        let tiles = TileSequence::new(placeholder_tiles(target)?);
        store.set_pieces(&tiles)?;
        store.clear_placements()?;
        tiles
    } else {
        if stored.len() != target {
            tracing::info!(
                requested = target,
                stored = stored.len(),
                "piece count follows stored pieces"
            );
        }
        stored
    };

    let core = PlayCore::new(store, tiles)?;
    core.placements()?;
    core.check_solved();
    Ok(core)
}
