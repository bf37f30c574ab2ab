use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use kirinuki_core::{
    cell_rects, resolve_grid, working_size, GridError, GridGeometry, Tile, TileError,
    MAX_SIDE_DEFAULT,
};

mod placeholder;
mod upload;

pub use placeholder::{placeholder_tiles, PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH};
pub use upload::{sniff_mime, validate_upload, UploadNotice, MAX_UPLOAD_BYTES};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid piece count: {0}")]
    InvalidCount(#[from] GridError),
    #[error("invalid data url: {0}")]
    DataUrl(#[from] TileError),
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("image encode failed: {0}")]
    Encode(String),
    #[error("invalid image dimensions")]
    Dimensions,
    #[error("unsupported upload type '{0}', expected an image")]
    UnsupportedUpload(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFormat {
    Png,
    Jpeg,
}

impl TileFormat {
    pub fn mime(self) -> &'static str {
        match self {
            TileFormat::Png => "image/png",
            TileFormat::Jpeg => "image/jpeg",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SliceConfig {
    pub format: TileFormat,
    /// Encoder quality in `0.0..=1.0`; only lossy formats use it.
    pub quality: f32,
    pub max_side: u32,
    pub stretch_to_ratio: bool,
    /// Width / height to stretch to; the grid's `cols / rows` when unset.
    pub target_ratio: Option<f64>,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            format: TileFormat::Png,
            quality: 0.92,
            max_side: MAX_SIDE_DEFAULT,
            stretch_to_ratio: true,
            target_ratio: None,
        }
    }
}

/// Cuts a source image into `n` grid tiles, row-major.
pub struct ImageSlicer {
    config: SliceConfig,
}

impl ImageSlicer {
    pub fn new(config: SliceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    pub fn slice(&self, bytes: &[u8], count: usize) -> Result<Vec<Tile>, PipelineError> {
        let grid = grid_for(count)?;
        let image =
            image::load_from_memory(bytes).map_err(|err| PipelineError::Decode(err.to_string()))?;
        self.slice_with_grid(&image, count, grid)
    }

    pub fn slice_data_url(&self, data_url: &str, count: usize) -> Result<Vec<Tile>, PipelineError> {
        let grid = grid_for(count)?;
        let source = Tile::from_data_url(data_url)?;
        let image = image::load_from_memory(source.bytes())
            .map_err(|err| PipelineError::Decode(err.to_string()))?;
        self.slice_with_grid(&image, count, grid)
    }

    pub fn slice_image(&self, image: &DynamicImage, count: usize) -> Result<Vec<Tile>, PipelineError> {
        let grid = grid_for(count)?;
        self.slice_with_grid(image, count, grid)
    }

    fn slice_with_grid(
        &self,
        image: &DynamicImage,
        count: usize,
        grid: GridGeometry,
    ) -> Result<Vec<Tile>, PipelineError> {
        let (src_w, src_h) = (image.width(), image.height());
        if src_w == 0 || src_h == 0 {
            return Err(PipelineError::Dimensions);
        }
        let target_ratio = self
            .config
            .stretch_to_ratio
            .then(|| self.config.target_ratio.unwrap_or_else(|| grid.aspect_ratio()));
        let (work_w, work_h) = working_size(src_w, src_h, self.config.max_side, target_ratio);
        // Every cell needs at least one pixel, even if that means upscaling a tiny source.
        let (work_w, work_h) = (work_w.max(grid.cols), work_h.max(grid.rows));
        tracing::debug!(
            src_w,
            src_h,
            work_w,
            work_h,
            cols = grid.cols,
            rows = grid.rows,
            count,
            "slicing image"
        );

        // One resample for the whole canvas; tiles are plain crops of it.
        let working = imageops::resize(&image.to_rgba8(), work_w, work_h, FilterType::Triangle);

        cell_rects(work_w, work_h, grid, count)
            .into_iter()
            .map(|rect| {
                let tile = imageops::crop_imm(&working, rect.x, rect.y, rect.width, rect.height)
                    .to_image();
                self.encode_tile(&tile)
            })
            .collect()
    }

    fn encode_tile(&self, tile: &RgbaImage) -> Result<Tile, PipelineError> {
        let bytes = encode_rgba(tile, self.config.format, self.config.quality)?;
        Tile::new(self.config.format.mime(), bytes)
            .map_err(|err| PipelineError::Encode(err.to_string()))
    }
}

impl Default for ImageSlicer {
    fn default() -> Self {
        Self::new(SliceConfig::default())
    }
}

fn grid_for(count: usize) -> Result<GridGeometry, PipelineError> {
    let count = u32::try_from(count).map_err(|_| PipelineError::Dimensions)?;
    Ok(resolve_grid(count)?)
}

pub(crate) fn encode_rgba(
    image: &RgbaImage,
    format: TileFormat,
    quality: f32,
) -> Result<Vec<u8>, PipelineError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::Dimensions);
    }
    let mut out = Cursor::new(Vec::new());
    match format {
        TileFormat::Png => PngEncoder::new(&mut out)
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|err| PipelineError::Encode(err.to_string()))?,
        TileFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut out, jpeg_quality(quality))
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|err| PipelineError::Encode(err.to_string()))?
        }
    }
    Ok(out.into_inner())
}

fn jpeg_quality(quality: f32) -> u8 {
    if !quality.is_finite() {
        return 92;
    }
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}
