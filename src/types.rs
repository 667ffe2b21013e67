//! Core types for UI component recognition

use crate::error::{RecognitionError, Result};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Side length of the normalized coordinate grid models report on
pub const NORMALIZED_GRID: f64 = 1000.0;

/// An uploaded image whose header has been decoded and validated
///
/// The encoded bytes are kept as-is so providers can forward them without
/// re-encoding. Cloning is cheap; the payload is shared.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    format: ImageFormat,
    data: Arc<[u8]>,
}

impl DecodedImage {
    /// Create a decoded image from already-extracted dimensions
    ///
    /// # Errors
    /// - Width or height is zero
    /// - Payload is empty
    pub fn new(width: u32, height: u32, format: ImageFormat, data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let data = data.into();
        if width == 0 || height == 0 {
            return Err(RecognitionError::invalid_image(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if data.is_empty() {
            return Err(RecognitionError::EmptyFile);
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Encoded image bytes as uploaded
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// MIME type of the encoded payload
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Upper-case format name ("PNG", "JPEG", "WEBP")
    #[must_use]
    pub fn format_name(&self) -> String {
        self.format
            .extensions_str()
            .first()
            .map_or_else(|| "UNKNOWN".to_string(), |ext| match *ext {
                "jpg" => "JPEG".to_string(),
                other => other.to_uppercase(),
            })
    }
}

/// Bounding box on the 0-1000 grid as reported by a model
///
/// No ordering is guaranteed: `xmax` may be less than or equal to `xmin`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxNormalized {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBoxNormalized {
    #[must_use]
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Whether either axis has a non-positive extent
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.xmax <= self.xmin || self.ymax <= self.ymin
    }
}

/// Bounding box in pixel space, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBoxPixel {
    pub x: u32,
    pub y: u32,
    /// Always at least 1
    pub width: u32,
    /// Always at least 1
    pub height: u32,
}

/// UI component category
///
/// Values outside the fixed set are carried through verbatim in
/// [`ComponentType::Other`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentType {
    Button,
    Input,
    Image,
    Text,
    Icon,
    Card,
    Unknown,
    Other(String),
}

impl ComponentType {
    /// The fixed set of categories models are asked to choose from
    pub const KNOWN: [ComponentType; 7] = [
        Self::Button,
        Self::Input,
        Self::Image,
        Self::Text,
        Self::Icon,
        Self::Card,
        Self::Unknown,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Button => "button",
            Self::Input => "input",
            Self::Image => "image",
            Self::Text => "text",
            Self::Icon => "icon",
            Self::Card => "card",
            Self::Unknown => "unknown",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for ComponentType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl From<&str> for ComponentType {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "button" => Self::Button,
            "input" => Self::Input,
            "image" => Self::Image,
            "text" => Self::Text,
            "icon" => Self::Icon,
            "card" => Self::Card,
            "unknown" => Self::Unknown,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for ComponentType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ComponentType> for String {
    fn from(value: ComponentType) -> Self {
        match value {
            ComponentType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected UI component in pixel space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDetection {
    /// `{provider}-{index}-{unix_seconds}`, unique within one response only
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub label: String,
    /// Passed through as reported; not clamped to [0, 1]
    pub confidence: f64,
    pub bbox: BoundingBoxPixel,
}
