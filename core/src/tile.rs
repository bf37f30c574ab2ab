use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TileError {
    #[error("not a data url")]
    NotDataUrl,
    #[error("data url is not base64 encoded")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Payload(String),
    #[error("empty tile payload")]
    Empty,
}

/// One encoded raster fragment. Two tiles are the same tile exactly when their
/// media type and encoded bytes are equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Tile {
    mime: Arc<str>,
    bytes: Arc<[u8]>,
}

impl Tile {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Result<Self, TileError> {
        if bytes.is_empty() {
            return Err(TileError::Empty);
        }
        let mime: String = mime.into();
        Ok(Self {
            mime: Arc::from(mime),
            bytes: Arc::from(bytes),
        })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn from_data_url(value: &str) -> Result<Self, TileError> {
        let rest = value
            .trim()
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or(TileError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(TileError::NotDataUrl)?;
        let mime = header
            .strip_suffix(BASE64_MARKER)
            .ok_or(TileError::NotBase64)?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|err| TileError::Payload(err.to_string()))?;
        let mime = if mime.is_empty() { "text/plain" } else { mime };
        Self::new(mime, bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "{DATA_URL_PREFIX}{}{BASE64_MARKER},{}",
            self.mime,
            STANDARD.encode(self.bytes())
        )
    }

    /// First 12 hex chars of the SHA-256 of the encoded bytes.
    pub fn digest(&self) -> String {
        let digest = Sha256::digest(self.bytes());
        let mut hex = String::with_capacity(12);
        for byte in digest.iter().take(6) {
            let _ = fmt::Write::write_fmt(&mut hex, format_args!("{:02x}", byte));
        }
        hex
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .field("digest", &self.digest())
            .finish()
    }
}

impl Serialize for Tile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for Tile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Tile::from_data_url(&raw).map_err(de::Error::custom)
    }
}

/// The canonical tile order: index `i` is the tile whose home is cell `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileSequence(Vec<Tile>);

impl TileSequence {
    pub fn new(tiles: Vec<Tile>) -> Self {
        Self(tiles)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Tile> {
        self.0.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.0.iter()
    }

    pub fn position(&self, tile: &Tile) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == tile)
    }
}

impl From<Vec<Tile>> for TileSequence {
    fn from(tiles: Vec<Tile>) -> Self {
        Self(tiles)
    }
}

impl<'a> IntoIterator for &'a TileSequence {
    type Item = &'a Tile;
    type IntoIter = std::slice::Iter<'a, Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
