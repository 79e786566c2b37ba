//! Page rasterization
//!
//! Conversion to images goes through the `PageRasterizer` seam. The shipped
//! `PlaceholderRasterizer` does not draw page content: it emits a blank white
//! page so the conversion pipeline (naming, encoding, per-page failure
//! handling) is fully exercised until a real renderer is plugged in.

use std::io::Cursor;

use image::{DynamicImage, Rgb, RgbImage};
use lopdf::{Document, ObjectId};

use super::error::EngineResult;
use super::types::ImageFormat;

/// Placeholder canvas: A4 in points, i.e. pixels at 72 DPI
pub const PLACEHOLDER_WIDTH: u32 = 595;
pub const PLACEHOLDER_HEIGHT: u32 = 842;

/// Turns one PDF page into a raster image
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, doc: &Document, page_id: ObjectId, dpi: u32) -> EngineResult<DynamicImage>;
}

/// Blank fixed-size page, independent of the requested DPI
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRasterizer;

impl PageRasterizer for PlaceholderRasterizer {
    fn rasterize(&self, _doc: &Document, _page_id: ObjectId, _dpi: u32) -> EngineResult<DynamicImage> {
        let canvas = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, Rgb([255, 255, 255]));
        Ok(DynamicImage::ImageRgb8(canvas))
    }
}

/// Encode an image in the requested output format
pub fn encode_image(image: &DynamicImage, format: ImageFormat) -> EngineResult<Vec<u8>> {
    let mut output = Vec::new();
    image.write_to(&mut Cursor::new(&mut output), format.encoder_format())?;
    Ok(output)
}
