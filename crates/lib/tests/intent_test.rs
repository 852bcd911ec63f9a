//! # Intent Analysis Tests

mod common;

use crate::common::{intent_response, setup_tracing, test_config, vxlan_entry, INTENT_KEY};
use kbrefine::errors::{IntentError, ModelErrorKind};
use kbrefine::intent::IntentAnalyzer;
use kbrefine::types::{Confidence, Entry, TermScope};
use kbrefine_test_utils::MockAiProvider;
use std::sync::Arc;
use std::time::Duration;

fn analyzer(provider: &MockAiProvider) -> IntentAnalyzer {
    IntentAnalyzer::new(Arc::new(provider.clone()), test_config().generation)
}

#[tokio::test]
async fn test_analyze_entry_with_empty_subtitle_and_body() {
    setup_tracing();
    // --- 1. Arrange ---
    let provider = MockAiProvider::new();
    provider.add_response(INTENT_KEY, &intent_response());

    // --- 2. Act ---
    let record = analyzer(&provider).analyze(&vxlan_entry()).await.unwrap();

    // --- 3. Assert ---
    assert_eq!(record.classification.scope, TermScope::Universal);
    assert_eq!(record.hedgehog_hints.len(), 2);
    assert_eq!(record.hedgehog_hints[0].confidence, Confidence::High);
    assert_eq!(record.hedgehog_hints[1].confidence, Confidence::Low);
    assert_eq!(record.research_guidance.verification_needs, vec!["EVPN control plane"]);

    let calls = provider.get_calls();
    assert_eq!(calls.len(), 1, "Intent analysis must make exactly one call");
    assert!(calls[0].1.contains("Title: VXLAN"));
}

#[tokio::test]
async fn test_empty_title_is_rejected_without_a_call() {
    let provider = MockAiProvider::new();
    provider.add_response(INTENT_KEY, &intent_response());

    let result = analyzer(&provider).analyze(&Entry::new("   ", "sub", "body")).await;

    assert!(matches!(result, Err(IntentError::EmptyTitle)));
    assert!(provider.get_calls().is_empty());
}

#[tokio::test]
async fn test_missing_markers_fail() {
    let provider = MockAiProvider::new();
    provider.add_response(INTENT_KEY, "I think VXLAN is a networking thing.");

    let result = analyzer(&provider).analyze(&vxlan_entry()).await;

    assert!(matches!(result, Err(IntentError::MissingSection("intent_analysis"))));
}

#[tokio::test]
async fn test_malformed_payload_fails_with_parse_error() {
    let provider = MockAiProvider::new();
    provider.add_response(
        INTENT_KEY,
        "<intent_analysis>{\"classification\": {\"scope\": </intent_analysis>",
    );

    let result = analyzer(&provider).analyze(&vxlan_entry()).await;

    match result {
        Err(IntentError::Parse(e)) => assert!(e.raw.contains("classification")),
        other => panic!("Expected a parse error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_mandatory_field_fails() {
    let provider = MockAiProvider::new();
    provider.add_response(
        INTENT_KEY,
        r#"<intent_analysis>{"classification": {"scope": "universal", "primary_domain": "x"},
            "hedgehog_hints": [], "research_guidance": {}}</intent_analysis>"#,
    );

    let result = analyzer(&provider).analyze(&vxlan_entry()).await;

    assert!(matches!(result, Err(IntentError::MissingField("core_definition"))));
}

#[tokio::test]
async fn test_model_error_is_not_retried() {
    let provider = MockAiProvider::new();
    provider.add_error(INTENT_KEY, ModelErrorKind::Quota);

    let result = analyzer(&provider).analyze(&vxlan_entry()).await;

    match result {
        Err(IntentError::Model(e)) => assert_eq!(e.kind(), ModelErrorKind::Quota),
        other => panic!("Expected a model error, got {other:?}"),
    }
    assert_eq!(provider.get_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_model_times_out() {
    let provider = MockAiProvider::new();
    provider.add_delayed_response(INTENT_KEY, Duration::from_secs(600), &intent_response());

    let result = analyzer(&provider).analyze(&vxlan_entry()).await;

    match result {
        Err(IntentError::Model(e)) => assert_eq!(e.kind(), ModelErrorKind::Timeout),
        other => panic!("Expected a timeout, got {other:?}"),
    }
}
