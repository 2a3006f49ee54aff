//! Image partitioner: cuts one image into per-position tiles for a layout.
//!
//! Tiles run left to right for horizontal layouts and top to bottom for
//! vertical ones. Every tile but the last has `floor(len / n)` pixels along
//! the split axis; the last one absorbs the remainder so the tiles cover the
//! source exactly, with no gap and no overlap.
//!
//! Tiles keep the format of the source image. Sources in a format the
//! encoder side cannot write come out as JPEG.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

use crate::errors::DomainError;
use crate::models::ScreenLayout;

/// Default JPEG quality for encoded tiles.
pub const DEFAULT_TILE_QUALITY: u8 = 90;

/// Encoding of generated tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl TileFormat {
    /// Format used for tiles cut from a source in `source`.
    pub fn for_source(source: Option<ImageFormat>) -> Self {
        match source {
            Some(ImageFormat::Png) => TileFormat::Png,
            Some(ImageFormat::WebP) => TileFormat::WebP,
            Some(ImageFormat::Gif) => TileFormat::Gif,
            _ => TileFormat::Jpeg,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            TileFormat::Png => ImageFormat::Png,
            TileFormat::Jpeg => ImageFormat::Jpeg,
            TileFormat::WebP => ImageFormat::WebP,
            TileFormat::Gif => ImageFormat::Gif,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TileFormat::Png => "png",
            TileFormat::Jpeg => "jpg",
            TileFormat::WebP => "webp",
            TileFormat::Gif => "gif",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            TileFormat::Png => "image/png",
            TileFormat::Jpeg => "image/jpeg",
            TileFormat::WebP => "image/webp",
            TileFormat::Gif => "image/gif",
        }
    }
}

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("could not determine image dimensions: {0}")]
    Decode(String),

    #[error("image of {width}x{height} is too small for {tiles} tiles")]
    TooSmall { width: u32, height: u32, tiles: i32 },

    #[error("could not encode tile: {0}")]
    Encode(String),
}

impl From<PartitionError> for DomainError {
    fn from(err: PartitionError) -> Self {
        match err {
            PartitionError::Decode(msg) => DomainError::ImageDecode(msg),
            PartitionError::TooSmall {
                width,
                height,
                tiles,
            } => DomainError::ImageTooSmall {
                width,
                height,
                tiles,
            },
            PartitionError::Encode(msg) => DomainError::Internal(msg),
        }
    }
}

/// Region of the source image covered by one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub position: i32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// An encoded tile.
#[derive(Debug, Clone)]
pub struct Tile {
    pub bytes: Vec<u8>,
    pub format: TileFormat,
    pub position: i32,
    pub width: u32,
    pub height: u32,
}

/// Computes tile boundaries for an image of `width` x `height`.
pub fn tile_rects(
    width: u32,
    height: u32,
    layout: ScreenLayout,
) -> Result<Vec<TileRect>, PartitionError> {
    let spec = layout.spec();
    let count = spec.position_count as u32;
    let axis_len = if spec.is_vertical { height } else { width };
    let tile_len = axis_len / count;

    if tile_len == 0 || width == 0 || height == 0 {
        return Err(PartitionError::TooSmall {
            width,
            height,
            tiles: spec.position_count,
        });
    }

    let rects = (0..count)
        .map(|i| {
            let offset = i * tile_len;
            let len = if i == count - 1 {
                axis_len - offset
            } else {
                tile_len
            };
            if spec.is_vertical {
                TileRect {
                    position: i as i32,
                    x: 0,
                    y: offset,
                    width,
                    height: len,
                }
            } else {
                TileRect {
                    position: i as i32,
                    x: offset,
                    y: 0,
                    width: len,
                    height,
                }
            }
        })
        .collect();

    Ok(rects)
}

/// Decodes `bytes`, cuts it for `layout` and encodes each tile in the
/// source's format. `quality` applies to JPEG output only.
///
/// CPU bound; async callers should run it on the blocking pool. Either every
/// tile is produced or an error is returned.
pub fn partition(bytes: &[u8], layout: ScreenLayout, quality: u8) -> Result<Vec<Tile>, PartitionError> {
    let format = TileFormat::for_source(image::guess_format(bytes).ok());
    let source =
        image::load_from_memory(bytes).map_err(|e| PartitionError::Decode(e.to_string()))?;
    let rects = tile_rects(source.width(), source.height(), layout)?;

    rects
        .into_iter()
        .map(|rect| {
            let region = source.crop_imm(rect.x, rect.y, rect.width, rect.height);
            Ok(Tile {
                bytes: encode_tile(&region, format, quality)?,
                format,
                position: rect.position,
                width: rect.width,
                height: rect.height,
            })
        })
        .collect()
}

fn encode_tile(
    region: &DynamicImage,
    format: TileFormat,
    quality: u8,
) -> Result<Vec<u8>, PartitionError> {
    let mut buf = Cursor::new(Vec::new());
    let result = match format {
        TileFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
            .encode_image(&region.to_rgb8()),
        TileFormat::Png => region.write_to(&mut buf, ImageFormat::Png),
        TileFormat::WebP | TileFormat::Gif => {
            // 8-bit RGB(A) is what these encoders accept.
            let narrowed = if region.color().has_alpha() {
                DynamicImage::ImageRgba8(region.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(region.to_rgb8())
            };
            narrowed.write_to(&mut buf, format.image_format())
        }
    };
    result.map_err(|e| PartitionError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}
