//! Configuration types for the recognition service

use crate::error::{RecognitionError, Result};
use crate::providers::ProviderKind;
use std::time::Duration;

/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
/// Default Gemini REST endpoint
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default OpenAI model
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
/// Default OpenAI REST endpoint
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default listen address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
/// Upload size limit (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Upstream request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Credential and endpoint settings for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    /// API key; `None` means the provider is not configured
    pub api_key: Option<String>,
    /// Upstream model identifier
    pub model: String,
    /// API base URL without trailing slash
    pub base_url: String,
}

impl ProviderCredentials {
    /// Defaults for the given provider with no credential
    #[must_use]
    pub fn unconfigured(kind: ProviderKind) -> Self {
        let (model, base_url) = match kind {
            ProviderKind::Gemini => (DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_BASE_URL),
            ProviderKind::OpenAi => (DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_BASE_URL),
        };
        Self {
            api_key: None,
            model: model.to_string(),
            base_url: base_url.to_string(),
        }
    }

    /// Set the API key; empty or whitespace-only keys count as absent
    #[must_use]
    pub fn with_api_key<S: Into<String>>(mut self, api_key: Option<S>) -> Self {
        self.api_key = api_key
            .map(Into::into)
            .filter(|key| !key.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Service-wide configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Provider selector as given by the operator; resolved by the factory
    pub selected_provider: String,
    /// Gemini settings
    pub gemini: ProviderCredentials,
    /// OpenAI settings
    pub openai: ProviderCredentials,
    /// HTTP listen address
    pub bind_addr: String,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
    /// Timeout applied to upstream model calls
    pub request_timeout: Duration,
}

impl ServiceConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Read configuration from process environment variables
    ///
    /// Recognised variables: `AI_PROVIDER`, `GEMINI_API_KEY`, `GEMINI_MODEL`,
    /// `GEMINI_API_BASE`, `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_API_BASE`,
    /// `PICHUNTER_ADDR`.
    ///
    /// # Errors
    /// - Resulting configuration fails validation
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// # Errors
    /// - Resulting configuration fails validation
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut gemini = ProviderCredentials::unconfigured(ProviderKind::Gemini)
            .with_api_key(lookup("GEMINI_API_KEY"));
        if let Some(model) = lookup("GEMINI_MODEL") {
            gemini = gemini.with_model(model);
        }
        if let Some(base) = lookup("GEMINI_API_BASE") {
            gemini = gemini.with_base_url(base);
        }

        let mut openai = ProviderCredentials::unconfigured(ProviderKind::OpenAi)
            .with_api_key(lookup("OPENAI_API_KEY"));
        if let Some(model) = lookup("OPENAI_MODEL") {
            openai = openai.with_model(model);
        }
        if let Some(base) = lookup("OPENAI_API_BASE") {
            openai = openai.with_base_url(base);
        }

        let mut builder = Self::builder().gemini(gemini).openai(openai);
        if let Some(provider) = lookup("AI_PROVIDER") {
            builder = builder.selected_provider(provider);
        }
        if let Some(addr) = lookup("PICHUNTER_ADDR") {
            builder = builder.bind_addr(addr);
        }
        builder.build()
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// - Empty bind address
    /// - Zero upload limit or zero timeout
    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            return Err(RecognitionError::invalid_config("bind address must not be empty"));
        }
        if self.max_upload_bytes == 0 {
            return Err(RecognitionError::invalid_config(
                "max upload size must be greater than 0",
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(RecognitionError::invalid_config(
                "request timeout must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Settings for the given provider
    #[must_use]
    pub fn credentials(&self, kind: ProviderKind) -> &ProviderCredentials {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAi => &self.openai,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            selected_provider: ProviderKind::default().name().to_string(),
            gemini: ProviderCredentials::unconfigured(ProviderKind::Gemini),
            openai: ProviderCredentials::unconfigured(ProviderKind::OpenAi),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Builder for `ServiceConfig`
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    #[must_use]
    pub fn selected_provider<S: Into<String>>(mut self, provider: S) -> Self {
        self.config.selected_provider = provider.into();
        self
    }

    #[must_use]
    pub fn gemini(mut self, credentials: ProviderCredentials) -> Self {
        self.config.gemini = credentials;
        self
    }

    #[must_use]
    pub fn openai(mut self, credentials: ProviderCredentials) -> Self {
        self.config.openai = credentials;
        self
    }

    #[must_use]
    pub fn gemini_api_key<S: Into<String>>(mut self, api_key: Option<S>) -> Self {
        self.config.gemini = self.config.gemini.with_api_key(api_key);
        self
    }

    #[must_use]
    pub fn openai_api_key<S: Into<String>>(mut self, api_key: Option<S>) -> Self {
        self.config.openai = self.config.openai.with_api_key(api_key);
        self
    }

    #[must_use]
    pub fn bind_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.config.bind_addr = addr.into();
        self
    }

    #[must_use]
    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the service configuration
    ///
    /// Credentials are not checked here; a provider without one fails on
    /// its first recognition call.
    ///
    /// # Errors
    /// - Configuration validation failures
    pub fn build(self) -> Result<ServiceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
