//! Provider selection and construction
//!
//! The factory is the only place that maps a provider selector string to a
//! concrete [`AiProvider`]. Selection never fails: an unknown or empty
//! selector falls back to Gemini, and a provider without a credential is
//! still constructed (it reports the missing credential when first used).

use crate::config::ServiceConfig;
use crate::providers::{AiProvider, GeminiProvider, OpenAiProvider, ProviderKind};
use std::sync::Arc;
use tracing::{info, warn};

/// Constructor stored in the provider registry
pub type ProviderConstructor = fn(&ServiceConfig) -> Arc<dyn AiProvider>;

/// Provider used when the selector is unknown or absent
pub const DEFAULT_PROVIDER: ProviderKind = ProviderKind::Gemini;

/// Registry of known selectors, matched case-insensitively
static PROVIDER_REGISTRY: &[(&str, ProviderKind, ProviderConstructor)] = &[
    ("gemini", ProviderKind::Gemini, build_gemini),
    ("google", ProviderKind::Gemini, build_gemini),
    ("openai", ProviderKind::OpenAi, build_openai),
    ("open-ai", ProviderKind::OpenAi, build_openai),
    ("gpt", ProviderKind::OpenAi, build_openai),
];

fn build_gemini(config: &ServiceConfig) -> Arc<dyn AiProvider> {
    Arc::new(GeminiProvider::new(
        config.gemini.clone(),
        config.request_timeout,
    ))
}

fn build_openai(config: &ServiceConfig) -> Arc<dyn AiProvider> {
    Arc::new(OpenAiProvider::new(
        config.openai.clone(),
        config.request_timeout,
    ))
}

fn lookup(selector: &str) -> Option<(ProviderKind, ProviderConstructor)> {
    let wanted = selector.trim().to_lowercase();
    PROVIDER_REGISTRY
        .iter()
        .find(|(name, _, _)| *name == wanted)
        .map(|(_, kind, constructor)| (*kind, *constructor))
}

/// Factory trait for creating AI providers
pub trait ProviderFactory: Send + Sync {
    /// Create the provider named by `config.selected_provider`
    ///
    /// Never fails; see the module documentation for the fallback policy.
    fn create_provider(&self, config: &ServiceConfig) -> Arc<dyn AiProvider>;

    /// List available provider kinds
    fn available_providers(&self) -> Vec<ProviderKind>;
}

/// Default provider factory backed by the static registry
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProviderFactory;

impl DefaultProviderFactory {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProviderFactory for DefaultProviderFactory {
    fn create_provider(&self, config: &ServiceConfig) -> Arc<dyn AiProvider> {
        let selector = config.selected_provider.as_str();
        let constructor = match lookup(selector) {
            Some((_, constructor)) => constructor,
            None => {
                warn!(
                    selector = selector,
                    fallback = DEFAULT_PROVIDER.name(),
                    "Unknown AI provider selector, falling back to default"
                );
                build_gemini
            },
        };

        let provider = constructor(config);
        info!(
            provider = provider.kind().name(),
            model = provider.model_id(),
            configured = provider.is_configured(),
            "AI provider selected"
        );
        provider
    }

    fn available_providers(&self) -> Vec<ProviderKind> {
        vec![ProviderKind::Gemini, ProviderKind::OpenAi]
    }
}
