//! HTTP request handlers for API endpoints

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use super::types::{HealthResponse, RecognitionResponse};
use super::ApiState;
use crate::error::RecognitionError;
use crate::service::RecognitionFailure;
use crate::services::ImageIOService;
use crate::tracing_config::events;

/// Multipart field carrying the screenshot
pub const UPLOAD_FIELD: &str = "file";

/// Error reply rendered as a `success: false` envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn new<S: Into<String>>(status: StatusCode, code: &'static str, message: S) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn missing_file() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "missing_file",
            format!("multipart field '{}' is required", UPLOAD_FIELD),
        )
    }
}

impl From<RecognitionError> for ApiError {
    fn from(err: RecognitionError) -> Self {
        let status = match &err {
            RecognitionError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RecognitionError::EmptyFile | RecognitionError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            RecognitionError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RecognitionError::Configuration(_)
            | RecognitionError::Upstream(_)
            | RecognitionError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<RecognitionFailure> for ApiError {
    fn from(failure: RecognitionFailure) -> Self {
        let message = failure.message().to_string();
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure.code(), message)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(StatusCode::PAYLOAD_TOO_LARGE, "file_too_large", err.body_text())
        } else {
            Self::new(StatusCode::BAD_REQUEST, "invalid_request", err.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(RecognitionResponse::failure(self.code, self.message))).into_response()
    }
}

/// Uploaded file as read from the multipart body
struct Upload {
    content_type: Option<String>,
    data: Vec<u8>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?.to_vec();
        return Ok(Upload { content_type, data });
    }
    Err(ApiError::missing_file())
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse::ok())
}

/// Recognize UI components in an uploaded screenshot
///
/// Validation order: content type, emptiness, size, header decode. The
/// provider is only called for a fully validated image.
pub async fn recognize(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(&mut multipart).await?;
    info!(
        content_type = upload.content_type.as_deref().unwrap_or("<none>"),
        size_bytes = upload.data.len(),
        "Recognition request received"
    );

    let image = ImageIOService::decode_upload(
        upload.data,
        upload.content_type.as_deref(),
        state.max_upload_bytes,
    )
    .map_err(|e| {
        events::upload_rejected(e.code(), &e);
        ApiError::from(e)
    })?;

    let report = state.service.run(&image).await?;
    Ok(Json(RecognitionResponse::success(&image, report)))
}
