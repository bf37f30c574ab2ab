use kirinuki_core::{resolve_grid, Tile, TileSequence};
use kirinuki_image_pipeline::{
    sniff_mime, validate_upload, ImageSlicer, PipelineError, SliceConfig, TileFormat,
    UploadNotice,
};

use crate::boot::{leading_int, PlayParams};
use crate::persisted_store::{KeyValueStore, PuzzleStore, StoreError};

/// Longest working side used when slicing an uploaded image.
pub const CONFIGURE_MAX_SIDE: u32 = 1200;

#[derive(Debug, thiserror::Error)]
pub enum ConfigureError {
    #[error("pick a difficulty and a size first")]
    MissingSelection,
    #[error("invalid size '{0}'")]
    InvalidSize(String),
    #[error(transparent)]
    Upload(#[from] PipelineError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The difficulty and piece count chosen on the configuration page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PuzzleSelection {
    pub difficulty: String,
    pub size: usize,
}

impl PuzzleSelection {
    /// Both selections are required; a size without digits counts as 1.
    pub fn parse(difficulty: Option<&str>, size: Option<&str>) -> Result<Self, ConfigureError> {
        let (Some(difficulty), Some(size)) = (
            difficulty.filter(|value| !value.trim().is_empty()),
            size.filter(|value| !value.trim().is_empty()),
        ) else {
            return Err(ConfigureError::MissingSelection);
        };
        let digits = size.trim_start().starts_with(|ch: char| ch.is_ascii_digit());
        let parsed = match leading_int(size) {
            Some(0) => 1,
            Some(count) if u32::try_from(count).is_ok() => count,
            None if !digits => 1,
            _ => return Err(ConfigureError::InvalidSize(size.to_string())),
        };
        Ok(Self {
            difficulty: difficulty.to_string(),
            size: parsed,
        })
    }

    pub fn params(&self) -> PlayParams {
        PlayParams::new(self.difficulty.clone(), self.size)
    }

    /// Slicer settings for this selection: PNG tiles stretched to the grid ratio.
    pub fn slice_config(&self) -> Result<SliceConfig, ConfigureError> {
        let count = u32::try_from(self.size)
            .map_err(|_| ConfigureError::InvalidSize(self.size.to_string()))?;
        let grid = resolve_grid(count).map_err(PipelineError::from)?;
        Ok(SliceConfig {
            format: TileFormat::Png,
            max_side: CONFIGURE_MAX_SIDE,
            stretch_to_ratio: true,
            target_ratio: Some(grid.aspect_ratio()),
            ..SliceConfig::default()
        })
    }
}

/// An uploaded image file.
#[derive(Clone, Debug)]
pub struct Upload {
    pub bytes: Vec<u8>,
    /// Declared media type; sniffed from the bytes when absent.
    pub mime: Option<String>,
}

impl Upload {
    pub fn validate(&self) -> Result<UploadNotice, PipelineError> {
        let mime = match &self.mime {
            Some(mime) => mime.as_str(),
            None => sniff_mime(&self.bytes).unwrap_or("application/octet-stream"),
        };
        validate_upload(mime, self.bytes.len() as u64)
    }
}

/// Result of slicing, handed to [`commit_configuration`].
#[derive(Debug)]
pub enum SliceResult {
    NoImage,
    Sliced {
        tiles: Vec<Tile>,
        notice: UploadNotice,
    },
    Failed(PipelineError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigureOutcome {
    Sliced {
        params: PlayParams,
        pieces: usize,
        notice: UploadNotice,
    },
    Unsliced {
        params: PlayParams,
    },
    /// The image could not be sliced; play continues with placeholders.
    SliceFailed {
        params: PlayParams,
        message: String,
    },
}

impl ConfigureOutcome {
    pub fn params(&self) -> &PlayParams {
        match self {
            ConfigureOutcome::Sliced { params, .. }
            | ConfigureOutcome::Unsliced { params }
            | ConfigureOutcome::SliceFailed { params, .. } => params,
        }
    }

    /// Query string for the play page.
    pub fn query(&self) -> String {
        self.params().to_query()
    }
}

/// Validates, slices and stores a new puzzle in one call.
pub fn configure_puzzle<S: KeyValueStore>(
    store: &PuzzleStore<S>,
    selection: &PuzzleSelection,
    upload: Option<&Upload>,
) -> Result<ConfigureOutcome, ConfigureError> {
    let result = match upload {
        None => SliceResult::NoImage,
        Some(upload) => {
            let notice = upload.validate()?;
            let slicer = ImageSlicer::new(selection.slice_config()?);
            match slicer.slice(&upload.bytes, selection.size) {
                Ok(tiles) => SliceResult::Sliced { tiles, notice },
                Err(err) => SliceResult::Failed(err),
            }
        }
    };
    commit_configuration(store, selection, result)
}

/// Stores the outcome of slicing. Any failure falls back to the unsliced flow.
pub fn commit_configuration<S: KeyValueStore>(
    store: &PuzzleStore<S>,
    selection: &PuzzleSelection,
    result: SliceResult,
) -> Result<ConfigureOutcome, ConfigureError> {
    let params = selection.params();
    match result {
        SliceResult::Sliced { tiles, notice } => {
            let pieces = tiles.len();
            store.set_pieces(&TileSequence::new(tiles))?;
            store.clear_placements()?;
            tracing::info!(pieces, difficulty = %selection.difficulty, "stored sliced puzzle");
            Ok(ConfigureOutcome::Sliced {
                params,
                pieces,
                notice,
            })
        }
        SliceResult::NoImage => {
            store.clear_puzzle()?;
            Ok(ConfigureOutcome::Unsliced { params })
        }
        SliceResult::Failed(err) => {
            tracing::warn!("slicing failed, continuing without an image: {err}");
            store.clear_puzzle()?;
            Ok(ConfigureOutcome::SliceFailed {
                params,
                message: err.to_string(),
            })
        }
    }
}
