//! PDF engine types

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Sentinel reported for absent document info fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Default rasterization resolution when the caller gives none
pub const DEFAULT_DPI: u32 = 300;

/// Image output formats for page conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Tiff,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Tiff];

    /// Case-insensitive parse of `PNG`, `JPEG` or `TIFF`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PNG" => Some(ImageFormat::Png),
            "JPEG" => Some(ImageFormat::Jpeg),
            "TIFF" => Some(ImageFormat::Tiff),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Tiff => "TIFF",
        }
    }

    /// File extension for output artifacts
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Tiff => "tiff",
        }
    }

    pub fn encoder_format(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
        }
    }
}

/// Compression level requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Smallest output: also drops thumbnails and XMP metadata
    Low,
    /// `High` plus merging of identical dictionaries and arrays
    #[default]
    Medium,
    /// Merge identical streams, prune and compress
    High,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::Low, Quality::Medium, Quality::High];

    /// Case-insensitive parse of `low`, `medium` or `high`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Quality::Low),
            "medium" => Some(Quality::Medium),
            "high" => Some(Quality::High),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
        }
    }
}

/// 1-based inclusive page selection; either bound may be omitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Concrete page numbers for a document with `total` pages.
    ///
    /// `start` defaults to 1 and `end` defaults to (and is clamped to) `total`.
    /// Returns `None` when nothing is selected.
    pub fn resolve(&self, total: u32) -> Option<RangeInclusive<u32>> {
        let start = self.start.unwrap_or(1).max(1);
        let end = self.end.unwrap_or(total).min(total);
        (start <= end).then_some(start..=end)
    }
}

/// Document properties reported by metadata extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub pages: usize,
    pub file_size: u64,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    pub producer: String,
    pub creation_date: String,
    pub modification_date: String,
    pub encrypted: bool,
    /// First-page MediaBox width in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_width: Option<f64>,
    /// First-page MediaBox height in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_height: Option<f64>,
}

/// Outcome of a compression run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionResult {
    pub output_file: String,
    pub original_size: u64,
    pub compressed_size: u64,
    /// Percentage reduction; zero or negative when the rewrite did not shrink the file
    pub compression_ratio: f64,
}

/// `(original - compressed) / original * 100`
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0
}
