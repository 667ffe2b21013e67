//! Recognition server command line
//!
//! Every flag falls back to an environment variable, so the server can be
//! configured the same way from a shell or a container environment.

use super::config::CliConfigBuilder;
use crate::{
    config::{
        DEFAULT_BIND_ADDR, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_MAX_UPLOAD_BYTES,
        DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL,
    },
    factory::{DefaultProviderFactory, ProviderFactory},
    server::{start_server, ApiState},
    tracing_config::{events, spans, TracingConfig, TracingFormat},
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info, Instrument};

/// UI screenshot component recognition server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "pichunter-server")]
pub struct Cli {
    /// AI provider (gemini, openai); unknown values fall back to gemini
    #[arg(long, env = "AI_PROVIDER", default_value = "gemini")]
    pub provider: String,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_api_base: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// OpenAI model
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_OPENAI_MODEL)]
    pub openai_model: String,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_OPENAI_BASE_URL)]
    pub openai_api_base: String,

    /// Address to listen on
    #[arg(short, long, env = "PICHUNTER_ADDR", default_value = DEFAULT_BIND_ADDR)]
    pub addr: String,

    /// Largest accepted upload in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Timeout for upstream model calls, in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Log output format
    #[arg(long, value_enum, default_value_t = CliLogFormat::Console)]
    pub log_format: CliLogFormat,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliLogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<CliLogFormat> for TracingFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Console => TracingFormat::Console,
            CliLogFormat::Compact => TracingFormat::Compact,
            #[cfg(feature = "tracing-json")]
            CliLogFormat::Json => TracingFormat::Json,
        }
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = uuid::Uuid::new_v4().to_string();
    init_tracing(&cli, &session_id).context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Invalid configuration")?;
    let factory = DefaultProviderFactory::new();
    let state = ApiState::from_config(&config, &factory);

    let provider = state.service.provider();
    if !provider.is_configured() {
        events::warning_with_recommendation(
            &format!("provider '{}' has no API key", provider.kind()),
            "set GEMINI_API_KEY or OPENAI_API_KEY; recognition requests will return ai_not_configured",
        );
    }
    debug!(
        available = ?factory.available_providers(),
        "Registered AI providers"
    );
    info!(
        addr = %config.bind_addr,
        max_upload_bytes = config.max_upload_bytes,
        timeout_secs = config.request_timeout.as_secs(),
        "Starting recognition server"
    );

    let span = spans::session(&session_id, provider.kind().name(), provider.model_id());
    start_server(&config.bind_addr, state)
        .instrument(span)
        .await
        .map_err(|e| {
            events::error_with_context(&e, "recognition server");
            e
        })
        .with_context(|| format!("Server on {} failed", config.bind_addr))
}

fn init_tracing(cli: &Cli, session_id: &str) -> Result<()> {
    let mut tracing_config = TracingConfig::new()
        .with_verbosity(cli.verbose)
        .with_format(cli.log_format.into())
        .with_session_id(session_id);

    // RUST_LOG takes precedence over -v
    if let Ok(filter) = std::env::var("RUST_LOG") {
        if !filter.trim().is_empty() {
            tracing_config = tracing_config.with_env_filter(filter);
        }
    }

    tracing_config
        .init()
        .context("Failed to initialize tracing subscriber")
}
