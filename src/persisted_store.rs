use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use kirinuki_core::{
    decode, encode, Placement, Tile, TileSequence, DEFAULT_VISIBLE_THUMB_COUNT, PIECES_KEY,
    PIECES_WARN_BYTES, PLACEMENTS_KEY, VISIBLE_THUMB_COUNT_KEY,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize '{0}'")]
    Serialize(&'static str),
}

/// String key-value storage scoped to one origin, the shape of browser `localStorage`.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Typed access to the persisted puzzle keys.
///
/// Readers never fail: a missing or unparseable value reads as empty (or the
/// default), since a stale browser profile must not break the board.
pub struct PuzzleStore<S> {
    backend: S,
}

impl<S: KeyValueStore> PuzzleStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn pieces(&self) -> TileSequence {
        let Some(raw) = self.backend.get_item(PIECES_KEY) else {
            return TileSequence::default();
        };
        match decode::<Vec<Tile>>(&raw) {
            Some(tiles) => TileSequence::new(tiles),
            None => {
                tracing::warn!(key = PIECES_KEY, len = raw.len(), "discarding unparseable pieces");
                TileSequence::default()
            }
        }
    }

    pub fn set_pieces(&self, tiles: &TileSequence) -> Result<(), StoreError> {
        let raw = encode(tiles).ok_or(StoreError::Serialize(PIECES_KEY))?;
        if raw.len() > PIECES_WARN_BYTES {
            tracing::warn!(
                kib = raw.len() / 1024,
                "piece payload may exceed the storage quota"
            );
        }
        self.backend.set_item(PIECES_KEY, &raw)
    }

    pub fn placements(&self) -> Placement {
        let Some(raw) = self.backend.get_item(PLACEMENTS_KEY) else {
            return Placement::default();
        };
        decode::<Placement>(&raw).unwrap_or_else(|| {
            tracing::warn!(key = PLACEMENTS_KEY, "discarding unparseable placements");
            Placement::default()
        })
    }

    pub fn set_placements(&self, placement: &Placement) -> Result<(), StoreError> {
        let raw = encode(placement).ok_or(StoreError::Serialize(PLACEMENTS_KEY))?;
        self.backend.set_item(PLACEMENTS_KEY, &raw)
    }

    pub fn clear_placements(&self) -> Result<(), StoreError> {
        self.backend.remove_item(PLACEMENTS_KEY)
    }

    /// Forgets the current puzzle; the thumb setting survives.
    pub fn clear_puzzle(&self) -> Result<(), StoreError> {
        self.backend.remove_item(PIECES_KEY)?;
        self.backend.remove_item(PLACEMENTS_KEY)
    }

    pub fn visible_thumb_count(&self) -> u32 {
        self.backend
            .get_item(VISIBLE_THUMB_COUNT_KEY)
            .and_then(|raw| parse_count(&raw))
            .unwrap_or(DEFAULT_VISIBLE_THUMB_COUNT)
    }

    pub fn set_visible_thumb_count(&self, count: u32) -> Result<(), StoreError> {
        let count = if count == 0 {
            DEFAULT_VISIBLE_THUMB_COUNT
        } else {
            count
        };
        self.backend
            .set_item(VISIBLE_THUMB_COUNT_KEY, &count.to_string())
    }
}

// Written as a bare number by the settings dialog, or a JSON string by older builds.
fn parse_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim().trim_matches('"');
    trimmed.parse::<u32>().ok().filter(|count| *count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(byte: u8) -> Tile {
        Tile::new("image/png", vec![byte]).unwrap()
    }

    #[test]
    fn missing_keys_read_as_empty() {
        let store = PuzzleStore::new(MemoryStore::new());
        assert!(store.pieces().is_empty());
        assert!(store.placements().is_empty());
        assert_eq!(store.visible_thumb_count(), DEFAULT_VISIBLE_THUMB_COUNT);
    }

    #[test]
    fn corrupt_json_reads_as_empty() {
        let backend = MemoryStore::new();
        backend.set_item(PIECES_KEY, "{not json").unwrap();
        backend.set_item(PLACEMENTS_KEY, r#"{"a":1}"#).unwrap();
        backend.set_item(VISIBLE_THUMB_COUNT_KEY, "lots").unwrap();
        let store = PuzzleStore::new(backend);
        assert!(store.pieces().is_empty());
        assert!(store.placements().is_empty());
        assert_eq!(store.visible_thumb_count(), DEFAULT_VISIBLE_THUMB_COUNT);
    }

    #[test]
    fn pieces_and_placements_round_trip() {
        let store = PuzzleStore::new(MemoryStore::new());
        let tiles = TileSequence::new(vec![tile(1), tile(2)]);
        store.set_pieces(&tiles).unwrap();
        let placement = Placement::from_cells(vec![None, Some(tile(1))]);
        store.set_placements(&placement).unwrap();
        assert_eq!(store.pieces(), tiles);
        assert_eq!(store.placements(), placement);

        store.clear_puzzle().unwrap();
        assert!(store.pieces().is_empty());
        assert!(store.placements().is_empty());
    }

    #[test]
    fn thumb_count_accepts_quoted_numbers() {
        let backend = MemoryStore::new();
        backend.set_item(VISIBLE_THUMB_COUNT_KEY, "\"6\"").unwrap();
        let store = PuzzleStore::new(backend);
        assert_eq!(store.visible_thumb_count(), 6);
        store.set_visible_thumb_count(10).unwrap();
        assert_eq!(store.visible_thumb_count(), 10);
        assert_eq!(
            store.backend().get_item(VISIBLE_THUMB_COUNT_KEY).as_deref(),
            Some("10")
        );
    }

    #[test]
    fn clear_puzzle_keeps_thumb_setting() {
        let store = PuzzleStore::new(MemoryStore::new());
        store.set_visible_thumb_count(4).unwrap();
        store.set_pieces(&TileSequence::new(vec![tile(7)])).unwrap();
        store.clear_puzzle().unwrap();
        assert_eq!(store.visible_thumb_count(), 4);
        assert_eq!(store.backend().len(), 1);
    }
}
