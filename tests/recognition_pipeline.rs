//! End-to-end recognition scenarios
//!
//! These tests drive `RecognitionService` through scripted providers and
//! through the real Gemini and OpenAI clients pointed at a local stand-in
//! for their REST APIs.

mod common;

use axum::http::StatusCode;
use common::{decoded_png, MockUpstream, ScriptedProvider, Script};
use pichunter::{
    ComponentType, DefaultProviderFactory, FailureKind, GeminiProvider, OpenAiProvider,
    ProviderCredentials, ProviderFactory, ProviderKind, RecognitionService, ServiceConfig,
};
use serde_json::json;
use std::time::Duration;

const BUTTON_ARRAY: &str =
    r#"[{"type":"button","label":"OK","confidence":0.9,"xmin":100,"ymin":200,"xmax":300,"ymax":400}]"#;

#[tokio::test]
async fn test_bare_array_maps_to_pixel_box() {
    let provider = ScriptedProvider::answering(ProviderKind::Gemini, BUTTON_ARRAY);
    let service = RecognitionService::new(provider.clone());

    let report = service.run(&decoded_png(1000, 500)).await.unwrap();

    assert_eq!(report.components.len(), 1);
    let component = &report.components[0];
    assert_eq!(component.component_type, ComponentType::Button);
    assert_eq!(component.label, "OK");
    assert!((component.confidence - 0.9).abs() < f64::EPSILON);
    assert_eq!(
        (component.bbox.x, component.bbox.y, component.bbox.width, component.bbox.height),
        (100, 100, 200, 100)
    );
    assert_eq!(provider.outbound_calls(), 1);
}

#[tokio::test]
async fn test_non_json_output_is_empty_success() {
    let provider = ScriptedProvider::answering(
        ProviderKind::Gemini,
        "I'm sorry, I can't identify components in this image.",
    );
    let service = RecognitionService::new(provider);

    let report = service.run(&decoded_png(320, 240)).await.unwrap();
    assert!(report.components.is_empty());
}

#[tokio::test]
async fn test_missing_credential_makes_no_outbound_call() {
    let provider = ScriptedProvider::new(ProviderKind::OpenAi, Script::Unconfigured);
    let service = RecognitionService::new(provider.clone());

    let failure = service.run(&decoded_png(10, 10)).await.unwrap_err();
    assert_eq!(failure.kind(), FailureKind::NotConfigured);
    assert_eq!(provider.outbound_calls(), 0);
}

#[tokio::test]
async fn test_wrapped_payload_matches_bare_array() {
    let image = decoded_png(1000, 500);

    let bare = RecognitionService::new(ScriptedProvider::answering(ProviderKind::OpenAi, BUTTON_ARRAY))
        .run(&image)
        .await
        .unwrap();
    let wrapped_payload = format!(r#"{{"items": {}}}"#, BUTTON_ARRAY);
    let wrapped =
        RecognitionService::new(ScriptedProvider::answering(ProviderKind::OpenAi, &wrapped_payload))
            .run(&image)
            .await
            .unwrap();

    assert_eq!(bare.components.len(), wrapped.components.len());
    for (a, b) in bare.components.iter().zip(&wrapped.components) {
        assert_eq!(a.component_type, b.component_type);
        assert_eq!(a.label, b.label);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.bbox, b.bbox);
    }
}

#[tokio::test]
async fn test_object_without_array_is_empty_success() {
    let provider = ScriptedProvider::answering(ProviderKind::OpenAi, r#"{"note":"nothing found"}"#);
    let report = RecognitionService::new(provider)
        .run(&decoded_png(10, 10))
        .await
        .unwrap();
    assert!(report.components.is_empty());
}

#[tokio::test]
async fn test_upstream_failure_is_not_retried() {
    let provider = ScriptedProvider::new(ProviderKind::Gemini, Script::Upstream("429 quota".to_string()));
    let service = RecognitionService::new(provider.clone());

    let failure = service.run(&decoded_png(10, 10)).await.unwrap_err();
    assert_eq!(failure.kind(), FailureKind::Upstream);
    assert!(failure.message().contains("429 quota"));
    assert_eq!(provider.outbound_calls(), 1);
}

#[tokio::test]
async fn test_divergent_defaults_per_provider() {
    let payload = r#"[{"xmin":0,"ymin":0}]"#;
    let image = decoded_png(100, 100);

    let gemini = RecognitionService::new(ScriptedProvider::answering(ProviderKind::Gemini, payload))
        .run(&image)
        .await
        .unwrap();
    let openai = RecognitionService::new(ScriptedProvider::answering(ProviderKind::OpenAi, payload))
        .run(&image)
        .await
        .unwrap();

    assert_eq!(gemini.components[0].confidence, 0.0);
    assert_eq!(gemini.components[0].label, "unknown element");
    assert_eq!(openai.components[0].confidence, 1.0);
    assert_eq!(openai.components[0].label, "");

    // Missing max coordinates collapse to a 1x1 box
    for report in [&gemini, &openai] {
        let bbox = report.components[0].bbox;
        assert_eq!((bbox.width, bbox.height), (1, 1));
        assert_eq!(report.components[0].component_type, ComponentType::Unknown);
    }
}

#[tokio::test]
async fn test_factory_falls_back_for_unknown_selector() {
    let config = ServiceConfig::builder()
        .selected_provider("definitely-not-a-provider")
        .build()
        .unwrap();
    let provider = DefaultProviderFactory::new().create_provider(&config);
    assert_eq!(provider.kind(), ProviderKind::Gemini);
    assert!(!provider.is_configured());
}

#[tokio::test]
async fn test_gemini_without_key_never_reaches_upstream() {
    let upstream = MockUpstream::start(StatusCode::OK, json!({})).await;
    let credentials = ProviderCredentials::unconfigured(ProviderKind::Gemini).with_base_url(&upstream.base_url);
    let service = RecognitionService::new(std::sync::Arc::new(GeminiProvider::new(
        credentials,
        Duration::from_secs(5),
    )));

    let failure = service.run(&decoded_png(10, 10)).await.unwrap_err();
    assert_eq!(failure.kind(), FailureKind::NotConfigured);
    assert_eq!(upstream.hits(), 0);
}

#[tokio::test]
async fn test_gemini_round_trip_against_local_upstream() {
    let upstream = MockUpstream::start(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": BUTTON_ARRAY}]},
                "finishReason": "STOP"
            }]
        }),
    )
    .await;
    let credentials = ProviderCredentials::unconfigured(ProviderKind::Gemini)
        .with_api_key(Some("test-key"))
        .with_base_url(&upstream.base_url);
    let service = RecognitionService::new(std::sync::Arc::new(GeminiProvider::new(
        credentials,
        Duration::from_secs(5),
    )));

    let report = service.run(&decoded_png(1000, 500)).await.unwrap();
    assert_eq!(report.model_version, "gemini-2.5-flash");
    assert_eq!(report.components.len(), 1);
    assert!(report.components[0].id.starts_with("gemini-0-"));
    assert_eq!(report.components[0].bbox.width, 200);

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/models/gemini-2.5-flash:generateContent");
    assert_eq!(requests[0].headers["x-goog-api-key"], "test-key");
    let parts = &requests[0].body["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], pichunter::RECOGNITION_PROMPT);
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    assert_eq!(requests[0].body["generationConfig"]["responseMimeType"], "application/json");
}

#[tokio::test]
async fn test_openai_round_trip_with_wrapped_object() {
    let content = format!(r#"{{"components": {}}}"#, BUTTON_ARRAY);
    let upstream = MockUpstream::start(
        StatusCode::OK,
        json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]}),
    )
    .await;
    let credentials = ProviderCredentials::unconfigured(ProviderKind::OpenAi)
        .with_api_key(Some("sk-test"))
        .with_base_url(&upstream.base_url);
    let service = RecognitionService::new(std::sync::Arc::new(OpenAiProvider::new(
        credentials,
        Duration::from_secs(5),
    )));

    let report = service.run(&decoded_png(1000, 500)).await.unwrap();
    assert_eq!(report.components.len(), 1);
    assert!(report.components[0].id.starts_with("openai-0-"));
    let bbox = report.components[0].bbox;
    assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (100, 100, 200, 100));

    let requests = upstream.requests();
    assert_eq!(requests[0].path, "/chat/completions");
    assert_eq!(requests[0].headers["authorization"], "Bearer sk-test");
    assert_eq!(requests[0].body["response_format"]["type"], "json_object");
    let url = requests[0].body["messages"][0]["content"][1]["image_url"]["url"]
        .as_str()
        .unwrap();
    assert!(url.starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn test_upstream_error_status_surfaces_as_upstream_failure() {
    let upstream = MockUpstream::start(
        StatusCode::TOO_MANY_REQUESTS,
        json!({"error": {"message": "Rate limit reached"}}),
    )
    .await;
    let credentials = ProviderCredentials::unconfigured(ProviderKind::OpenAi)
        .with_api_key(Some("sk-test"))
        .with_base_url(&upstream.base_url);
    let service = RecognitionService::new(std::sync::Arc::new(OpenAiProvider::new(
        credentials,
        Duration::from_secs(5),
    )));

    let failure = service.run(&decoded_png(10, 10)).await.unwrap_err();
    assert_eq!(failure.kind(), FailureKind::Upstream);
    assert!(failure.message().contains("429"));
    assert!(failure.message().contains("Rate limit reached"));
    assert_eq!(upstream.hits(), 1);
}
