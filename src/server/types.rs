//! Request and response types for the HTTP API

use crate::service::RecognitionReport;
use crate::types::{ComponentDetection, DecodedImage};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Server-side confidence filter; no filtering is applied
pub const CONFIDENCE_THRESHOLD: f64 = 0.0;

/// Service name reported by the health check
pub const SERVICE_NAME: &str = "Pichunter Backend";

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: now_rfc3339(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Machine-readable error carried in the response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Metadata about the uploaded image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub size_bytes: usize,
}

impl From<&DecodedImage> for ImageInfo {
    fn from(image: &DecodedImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            format: image.format_name(),
            size_bytes: image.size_bytes(),
        }
    }
}

/// Processing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionMetadata {
    pub processing_time_ms: u64,
    pub model_version: String,
    pub confidence_threshold: f64,
}

/// Successful recognition payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub image_info: ImageInfo,
    pub components: Vec<ComponentDetection>,
    pub metadata: RecognitionMetadata,
}

/// Response envelope shared by success and error replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionResponse {
    pub success: bool,
    pub data: Option<RecognitionResult>,
    pub error: Option<ErrorDetail>,
    pub timestamp: String,
}

impl RecognitionResponse {
    /// Build a success envelope from a recognition report
    #[must_use]
    pub fn success(image: &DecodedImage, report: RecognitionReport) -> Self {
        let metadata = RecognitionMetadata {
            processing_time_ms: report.processing_time_ms(),
            model_version: report.model_version,
            confidence_threshold: CONFIDENCE_THRESHOLD,
        };
        Self {
            success: true,
            data: Some(RecognitionResult {
                image_info: ImageInfo::from(image),
                components: report.components,
                metadata,
            }),
            error: None,
            timestamp: now_rfc3339(),
        }
    }

    /// Build an error envelope
    #[must_use]
    pub fn failure<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorDetail {
                code: code.into(),
                message: message.into(),
            }),
            timestamp: now_rfc3339(),
        }
    }
}
