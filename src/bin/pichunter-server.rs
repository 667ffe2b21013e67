//! Pichunter recognition server
//!
//! HTTP service that detects UI components in uploaded screenshots using a
//! configurable vision model provider (Gemini or OpenAI).

#[cfg(feature = "cli")]
use pichunter::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
