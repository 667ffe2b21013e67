//! Shared fixtures for integration tests
//!
//! - `ScriptedProvider`: an `AiProvider` answering from a script, built on
//!   the public parse-then-map handoff
//! - `MockUpstream`: a local HTTP server standing in for the Gemini and
//!   OpenAI REST APIs
//! - helpers for encoded test images and for starting the API server

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Json, Router,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use pichunter::{
    detections_from_payload, AiProvider, ApiState, ComponentDetection, DecodedImage,
    ProviderKind, RecognitionError, RecognitionService,
};
use serde_json::Value;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// What a scripted provider does when called
#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Answer with this raw model text
    Payload(String),
    /// Behave as if no credential were configured
    Unconfigured,
    /// Fail the upstream call with this message
    Upstream(String),
}

/// Provider double that counts simulated outbound calls
#[derive(Debug)]
pub(crate) struct ScriptedProvider {
    kind: ProviderKind,
    script: Script,
    outbound_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new(kind: ProviderKind, script: Script) -> Arc<Self> {
        Arc::new(Self {
            kind,
            script,
            outbound_calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn answering(kind: ProviderKind, payload: &str) -> Arc<Self> {
        Self::new(kind, Script::Payload(payload.to_string()))
    }

    pub(crate) fn outbound_calls(&self) -> usize {
        self.outbound_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    fn is_configured(&self) -> bool {
        !matches!(self.script, Script::Unconfigured)
    }

    async fn recognize(&self, image: &DecodedImage) -> pichunter::Result<Vec<ComponentDetection>> {
        match &self.script {
            Script::Unconfigured => Err(RecognitionError::configuration(format!(
                "{} API key is not configured",
                self.kind
            ))),
            Script::Upstream(message) => {
                self.outbound_calls.fetch_add(1, Ordering::SeqCst);
                Err(RecognitionError::upstream(message.clone()))
            },
            Script::Payload(raw) => {
                self.outbound_calls.fetch_add(1, Ordering::SeqCst);
                Ok(detections_from_payload(raw, self.kind.conventions(), image))
            },
        }
    }
}

/// Encode a blank RGB image
pub(crate) fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

/// A decoded PNG of the given size
pub(crate) fn decoded_png(width: u32, height: u32) -> DecodedImage {
    DecodedImage::new(width, height, ImageFormat::Png, encoded_image(width, height, ImageFormat::Png))
        .unwrap()
}

/// Start the API server on an ephemeral port, returning its base URL
pub(crate) async fn spawn_api(provider: Arc<dyn AiProvider>, max_upload_bytes: usize) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = ApiState::new(RecognitionService::new(provider), max_upload_bytes);
    let handle = tokio::spawn(async move {
        pichunter::serve(listener, state).await.unwrap();
    });
    (format!("http://{}", addr), handle)
}

/// A request captured by [`MockUpstream`]
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Value,
}

#[derive(Clone)]
struct UpstreamState {
    status: StatusCode,
    reply: Value,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn record(
    State(state): State<UpstreamState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        headers,
        body,
    });
    (state.status, Json(state.reply.clone()))
}

/// Local stand-in for a provider's REST API
pub(crate) struct MockUpstream {
    pub(crate) base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    /// Answer every request with `status` and the JSON `reply`
    pub(crate) async fn start(status: StatusCode, reply: Value) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = UpstreamState {
            status,
            reply,
            requests: requests.clone(),
        };
        let app = Router::new().fallback(record).with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
            handle,
        }
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
