//! Image upload validation and header decoding
//!
//! This module turns raw upload bytes into a [`DecodedImage`]. Only the image
//! header is read, which is enough for width, height and format; the pixel
//! data is forwarded to the model untouched.

use crate::error::{RecognitionError, Result};
use crate::types::DecodedImage;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// Content types accepted by the upload endpoint
pub const SUPPORTED_CONTENT_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// Service for validating and decoding uploaded images
pub struct ImageIOService;

impl ImageIOService {
    /// Whether `content_type` names an accepted image type
    ///
    /// Parameters such as `; charset=binary` are ignored and the comparison
    /// is case-insensitive.
    #[must_use]
    pub fn is_supported_content_type(content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        SUPPORTED_CONTENT_TYPES.contains(&essence.as_str())
    }

    /// Validate an upload and decode its header
    ///
    /// Checks run in this order: content type, emptiness, size limit, header
    /// decode.
    ///
    /// # Arguments
    /// * `data` - Raw uploaded bytes
    /// * `content_type` - Declared content type, if the client sent one
    /// * `max_bytes` - Largest accepted upload
    ///
    /// # Errors
    /// - `UnsupportedMediaType` for a missing or unaccepted content type
    /// - `EmptyFile` for a zero-length upload
    /// - `FileTooLarge` when `data` exceeds `max_bytes`
    /// - `InvalidImage` when the header cannot be decoded
    ///
    /// # Examples
    /// ```rust,no_run
    /// use pichunter::services::ImageIOService;
    ///
    /// let bytes = std::fs::read("screenshot.png")?;
    /// let image = ImageIOService::decode_upload(bytes, Some("image/png"), 10 * 1024 * 1024)?;
    /// println!("{}x{}", image.width(), image.height());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn decode_upload(
        data: impl Into<Vec<u8>>,
        content_type: Option<&str>,
        max_bytes: usize,
    ) -> Result<DecodedImage> {
        let content_type = content_type.unwrap_or_default();
        if !Self::is_supported_content_type(content_type) {
            log::debug!("Rejecting upload with content type {:?}", content_type);
            return Err(RecognitionError::unsupported_media_type(if content_type.is_empty() {
                "missing content type".to_string()
            } else {
                content_type.to_string()
            }));
        }

        let data = data.into();
        if data.is_empty() {
            return Err(RecognitionError::EmptyFile);
        }
        if data.len() > max_bytes {
            return Err(RecognitionError::FileTooLarge {
                size: data.len(),
                limit: max_bytes,
            });
        }

        let (format, (width, height)) = Self::read_header(&data)?;
        log::debug!(
            "Decoded upload header: {}x{} {:?}, {} bytes",
            width,
            height,
            format,
            data.len()
        );
        DecodedImage::new(width, height, format, data)
    }

    /// Read format and dimensions from the image header
    ///
    /// # Errors
    /// - `InvalidImage` for unrecognized, unsupported or truncated data
    pub fn read_header(data: &[u8]) -> Result<(ImageFormat, (u32, u32))> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| RecognitionError::invalid_image(format!("cannot read image header: {}", e)))?;

        let format = match reader.format() {
            Some(format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP)) => format,
            Some(other) => {
                return Err(RecognitionError::invalid_image(format!(
                    "unsupported image format {:?}",
                    other
                )))
            },
            None => return Err(RecognitionError::invalid_image("unrecognized image data")),
        };

        let dimensions = reader
            .into_dimensions()
            .map_err(|e| RecognitionError::invalid_image(e.to_string()))?;
        Ok((format, dimensions))
    }
}
