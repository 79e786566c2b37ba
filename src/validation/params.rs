//! Operation parameter validation

use serde_json::{Map, Value};

use crate::error::{AppError, Result};
use crate::pdf::{ImageFormat, PageRange, Quality};

pub const MIN_DPI: u32 = 72;
pub const MAX_DPI: u32 = 600;

/// Typed view of an operation request body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationParams {
    pub files: Option<Vec<String>>,
    pub file: Option<String>,
    pub pages: Option<PageRange>,
    pub format: Option<ImageFormat>,
    pub dpi: Option<u32>,
    pub quality: Option<Quality>,
}

impl OperationParams {
    /// Validated `files` list; only call for operations that require it
    pub fn files(&self) -> Result<&[String]> {
        self.files
            .as_deref()
            .ok_or_else(|| AppError::MissingParameter(vec!["files".to_string()]))
    }

    /// Validated `file` name; only call for operations that require it
    pub fn file(&self) -> Result<&str> {
        self.file
            .as_deref()
            .ok_or_else(|| AppError::MissingParameter(vec!["file".to_string()]))
    }
}

/// Validate a JSON request body against an operation's required keys.
///
/// All missing required keys are reported together. Present keys are then
/// checked in a fixed order (files, file, pages, format, dpi, quality) and the
/// first invalid one is reported.
pub fn validate_operation_params(body: &Value, required: &[&str]) -> Result<OperationParams> {
    let data = match body {
        Value::Object(map) if !map.is_empty() || required.is_empty() => map,
        Value::Object(_) | Value::Null => {
            return Err(AppError::invalid_parameter("body", "No data provided"))
        }
        _ => return Err(AppError::invalid_parameter("body", "Request body must be a JSON object")),
    };

    let missing: Vec<String> = required
        .iter()
        .filter(|key| !data.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(AppError::MissingParameter(missing));
    }

    Ok(OperationParams {
        files: data.get("files").map(parse_files).transpose()?,
        file: data.get("file").map(parse_file).transpose()?,
        pages: data.get("pages").map(parse_pages).transpose()?,
        format: data.get("format").map(parse_format).transpose()?,
        dpi: data.get("dpi").map(parse_dpi).transpose()?,
        quality: data.get("quality").map(parse_quality).transpose()?,
    })
}

fn parse_files(value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| AppError::invalid_parameter("files", "Files parameter must be a list"))?;

    if items.is_empty() {
        return Err(AppError::invalid_parameter("files", "Files list cannot be empty"));
    }

    items
        .iter()
        .map(|item| match item.as_str() {
            Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
            _ => Err(AppError::invalid_parameter("files", "Invalid filename in files list")),
        })
        .collect()
}

fn parse_file(value: &Value) -> Result<String> {
    match value.as_str() {
        Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
        _ => Err(AppError::invalid_parameter(
            "file",
            "File parameter must be a valid filename",
        )),
    }
}

fn parse_pages(value: &Value) -> Result<PageRange> {
    let pages = value
        .as_object()
        .ok_or_else(|| AppError::invalid_parameter("pages", "Pages parameter must be an object"))?;

    let start = page_number(pages, "start", "Start page must be a positive integer")?;
    let end = page_number(pages, "end", "End page must be a positive integer")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AppError::invalid_parameter(
                "pages",
                "Start page cannot be greater than end page",
            ));
        }
    }

    Ok(PageRange { start, end })
}

fn page_number(pages: &Map<String, Value>, key: &str, reason: &str) -> Result<Option<u32>> {
    match pages.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|n| *n >= 1)
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| AppError::invalid_parameter("pages", reason)),
    }
}

fn parse_format(value: &Value) -> Result<ImageFormat> {
    value.as_str().and_then(ImageFormat::parse).ok_or_else(|| {
        let supported: Vec<&str> = ImageFormat::ALL.iter().map(ImageFormat::name).collect();
        AppError::invalid_parameter(
            "format",
            format!("Invalid format. Supported: {}", supported.join(", ")),
        )
    })
}

fn parse_dpi(value: &Value) -> Result<u32> {
    value
        .as_u64()
        .and_then(|dpi| u32::try_from(dpi).ok())
        .filter(|dpi| (MIN_DPI..=MAX_DPI).contains(dpi))
        .ok_or_else(|| {
            AppError::invalid_parameter(
                "dpi",
                format!("DPI must be an integer between {} and {}", MIN_DPI, MAX_DPI),
            )
        })
}

fn parse_quality(value: &Value) -> Result<Quality> {
    value.as_str().and_then(Quality::parse).ok_or_else(|| {
        let supported: Vec<&str> = Quality::ALL.iter().map(Quality::name).collect();
        AppError::invalid_parameter(
            "quality",
            format!("Invalid quality. Supported: {}", supported.join(", ")),
        )
    })
}
