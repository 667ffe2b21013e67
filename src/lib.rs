#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

//! # Pichunter
//!
//! UI screenshot component recognition over pluggable vision-model providers.
//!
//! An uploaded screenshot is validated, forwarded to a cloud vision-language
//! model (Gemini or OpenAI), and the model's loosely structured JSON answer is
//! parsed defensively and mapped from the model's 0-1000 grid to pixel
//! coordinates.
//!
//! ## Pipeline
//!
//! ```text
//! upload -> ImageIOService -> RecognitionService -> AiProvider::recognize
//!        -> ResultParser -> to_pixel_box -> Vec<ComponentDetection>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pichunter::{
//!     DefaultProviderFactory, ImageIOService, RecognitionService, ServiceConfig,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServiceConfig::from_env()?;
//! let service = RecognitionService::from_config(&config, &DefaultProviderFactory::new());
//!
//! let bytes = std::fs::read("screenshot.png")?;
//! let image = ImageIOService::decode_upload(bytes, Some("image/png"), config.max_upload_bytes)?;
//!
//! match service.run(&image).await {
//!     Ok(report) => {
//!         for component in &report.components {
//!             println!("{} {:?} at {:?}", component.component_type, component.label, component.bbox);
//!         }
//!     },
//!     Err(failure) => eprintln!("recognition failed: {}", failure),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): `pichunter-server` command line and subscriber setup
//! - `tracing-json`: JSON log output for the server

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod factory;
pub mod mapping;
pub mod parser;
pub mod providers;
pub mod server;
pub mod service;
pub mod services;
pub mod tracing_config;
pub mod types;

// Public API exports
pub use config::{ProviderCredentials, ServiceConfig, ServiceConfigBuilder};
pub use error::{RecognitionError, Result};
pub use factory::{DefaultProviderFactory, ProviderFactory};
pub use mapping::to_pixel_box;
pub use parser::{ParseFailure, ParsedDetection, ParserConventions, RawDetection, ResultParser};
pub use providers::{
    detections_from_payload, AiProvider, GeminiProvider, OpenAiProvider, ProviderKind,
    RECOGNITION_PROMPT,
};
pub use server::{build_router, serve, start_server, ApiState};
pub use service::{
    FailureKind, RecognitionFailure, RecognitionOutcome, RecognitionReport, RecognitionService,
};
pub use services::ImageIOService;
pub use types::{
    BoundingBoxNormalized, BoundingBoxPixel, ComponentDetection, ComponentType, DecodedImage,
};

pub use tracing_config::{TracingConfig, TracingFormat};
