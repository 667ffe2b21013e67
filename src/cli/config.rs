//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::Cli;
use crate::config::{ProviderCredentials, ServiceConfig};
use crate::providers::ProviderKind;
use anyhow::{Context, Result};
use std::time::Duration;

/// Convert CLI arguments to `ServiceConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build `ServiceConfig` from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<ServiceConfig> {
        let gemini = ProviderCredentials::unconfigured(ProviderKind::Gemini)
            .with_api_key(cli.gemini_api_key.clone())
            .with_model(cli.gemini_model.clone())
            .with_base_url(cli.gemini_api_base.clone());
        let openai = ProviderCredentials::unconfigured(ProviderKind::OpenAi)
            .with_api_key(cli.openai_api_key.clone())
            .with_model(cli.openai_model.clone())
            .with_base_url(cli.openai_api_base.clone());

        ServiceConfig::builder()
            .selected_provider(cli.provider.clone())
            .gemini(gemini)
            .openai(openai)
            .bind_addr(cli.addr.clone())
            .max_upload_bytes(cli.max_upload_bytes)
            .request_timeout(Duration::from_secs(cli.timeout_secs))
            .build()
            .context("Invalid service configuration")
    }
}
