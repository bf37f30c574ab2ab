use image::{Rgba, RgbaImage};
use kirinuki_core::Tile;

use crate::{encode_rgba, PipelineError, TileFormat};

pub const PLACEHOLDER_WIDTH: u32 = 240;
pub const PLACEHOLDER_HEIGHT: u32 = 160;

const HUE_STEP: u32 = 137;
const MARK_BITS: u32 = 16;
const MARK_SIZE: u32 = 8;
const MARK_INK: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 0xff]);
const MARK_PAPER: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

/// Synthesizes `count` stand-in tiles for a board with no uploaded image.
///
/// Each tile is a flat pastel with a binary strip of its index along the
/// bottom edge, so no two placeholders share content.
pub fn placeholder_tiles(count: usize) -> Result<Vec<Tile>, PipelineError> {
    (0..count).map(placeholder_tile).collect()
}

fn placeholder_tile(index: usize) -> Result<Tile, PipelineError> {
    let hue = ((index as u64 * HUE_STEP as u64) % 360) as f32;
    let fill = hsl_to_rgba(hue, 0.6, 0.7);
    let mut canvas = RgbaImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, fill);

    let top = PLACEHOLDER_HEIGHT - MARK_SIZE * 2;
    let id = index as u64;
    for bit in 0..MARK_BITS.max(64 - id.leading_zeros()) {
        let left = MARK_SIZE + bit * MARK_SIZE;
        if left + MARK_SIZE > PLACEHOLDER_WIDTH {
            break;
        }
        let color = if (id >> bit) & 1 == 1 { MARK_INK } else { MARK_PAPER };
        for y in top..top + MARK_SIZE {
            for x in left..left + MARK_SIZE {
                canvas.put_pixel(x, y, color);
            }
        }
    }

    let bytes = encode_rgba(&canvas, TileFormat::Png, 1.0)?;
    Tile::new(TileFormat::Png.mime(), bytes).map_err(|err| PipelineError::Encode(err.to_string()))
}

fn hsl_to_rgba(hue: f32, saturation: f32, lightness: f32) -> Rgba<u8> {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    let to_u8 = |value: f32| ((value + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba([to_u8(r), to_u8(g), to_u8(b), 0xff])
}
