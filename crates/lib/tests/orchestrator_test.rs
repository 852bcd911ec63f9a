//! # Refinement Orchestrator Tests
//!
//! Drives full runs against scripted providers and checks the terminal status,
//! the retry budget and the feedback handed back to the writer.

mod common;

use crate::common::{
    failing_review, header_writer_response, intent_response, passing_review,
    passing_writer_response, setup_tracing, synthesis_response, tagged_writer_response,
    test_config, vxlan_entry, INTENT_KEY, REVIEW_KEY, SYNTHESIS_KEY, WRITER_KEY,
};
use kbrefine::config::PipelineConfig;
use kbrefine::errors::ModelErrorKind;
use kbrefine::orchestrator::{RefinementOrchestrator, CANCELLED_REASON, GENERATION_FAILED_REASON};
use kbrefine::types::RunStatus;
use kbrefine_test_utils::{MockAiProvider, MockSearchProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn orchestrator(ai: &MockAiProvider, search: &MockSearchProvider, config: &PipelineConfig) -> RefinementOrchestrator {
    RefinementOrchestrator::new(Arc::new(ai.clone()), Arc::new(search.clone()), config)
}

fn scripted_ai() -> MockAiProvider {
    let ai = MockAiProvider::new();
    ai.add_response(INTENT_KEY, &intent_response());
    ai.add_response(SYNTHESIS_KEY, &synthesis_response());
    ai
}

#[tokio::test]
async fn test_first_draft_passes() {
    setup_tracing();
    // --- 1. Arrange ---
    let ai = scripted_ai();
    ai.add_response(WRITER_KEY, &passing_writer_response());
    ai.add_response(REVIEW_KEY, &passing_review());
    let search = MockSearchProvider::new();

    // --- 2. Act ---
    let result = orchestrator(&ai, &search, &test_config()).run(&vxlan_entry()).await;

    // --- 3. Assert ---
    assert_eq!(result.status, RunStatus::Accepted, "reason: {}", result.reason);
    assert_eq!(result.iterations, 1);
    assert!(result.reason.starts_with("passed quality gate on attempt 1"));
    assert!(result.draft.is_some());
    assert!(result.verdict.as_ref().unwrap().passed());
    assert_eq!(ai.call_count(WRITER_KEY), 1);
    assert_eq!(ai.call_count(REVIEW_KEY), 1);
}

#[tokio::test]
async fn test_header_draft_is_retried_with_structure_feedback() {
    setup_tracing();
    // --- 1. Arrange ---
    let ai = scripted_ai();
    ai.add_sequence(WRITER_KEY, &[&header_writer_response(), &passing_writer_response()]);
    ai.add_response(REVIEW_KEY, &passing_review());
    let search = MockSearchProvider::new();

    // --- 2. Act ---
    let result = orchestrator(&ai, &search, &test_config()).run(&vxlan_entry()).await;

    // --- 3. Assert ---
    assert_eq!(result.status, RunStatus::Accepted, "reason: {}", result.reason);
    assert_eq!(result.iterations, 2);
    assert!(!result.draft.as_ref().unwrap().body.contains("<h2>"));

    let writer_calls = ai.calls_matching(WRITER_KEY);
    assert_eq!(writer_calls.len(), 2);
    let retry_prompt = &writer_calls[1].1;
    assert!(retry_prompt.contains("content_structure score 7.00 is below the minimum of 8.0"));
    assert!(retry_prompt.contains("<h2>"));
}

#[tokio::test]
async fn test_exhausted_budget_keeps_last_draft() {
    // --- 1. Arrange ---
    let ai = scripted_ai();
    ai.add_sequence(
        WRITER_KEY,
        &[
            &tagged_writer_response("first"),
            &tagged_writer_response("second"),
            &tagged_writer_response("third"),
        ],
    );
    ai.add_response(REVIEW_KEY, &failing_review());
    let search = MockSearchProvider::new();

    // --- 2. Act ---
    let result = orchestrator(&ai, &search, &test_config()).run(&vxlan_entry()).await;

    // --- 3. Assert ---
    assert_eq!(result.status, RunStatus::AcceptedWithIssues);
    assert_eq!(result.iterations, 3);
    assert!(result.draft.as_ref().unwrap().subtitle.starts_with("third "));
    assert!(result
        .reason
        .contains("technical_accuracy score 5.00 is below the minimum of 8.0"));
    assert_eq!(ai.call_count(WRITER_KEY), 3);
    assert_eq!(ai.call_count(REVIEW_KEY), 3);
}

#[tokio::test]
async fn test_retry_budget_is_configurable() {
    let ai = scripted_ai();
    ai.add_response(WRITER_KEY, &passing_writer_response());
    ai.add_response(REVIEW_KEY, &failing_review());
    let search = MockSearchProvider::new();
    let mut config = test_config();
    config.generation.max_iterations = 1;

    let result = orchestrator(&ai, &search, &config).run(&vxlan_entry()).await;

    assert_eq!(result.status, RunStatus::AcceptedWithIssues);
    assert_eq!(result.iterations, 1);
    assert_eq!(ai.call_count(WRITER_KEY), 1);
}

#[tokio::test]
async fn test_intent_failure_stops_the_run() {
    let ai = MockAiProvider::new();
    ai.add_response(INTENT_KEY, "no markers here");
    ai.add_response(WRITER_KEY, &passing_writer_response());
    let search = MockSearchProvider::new();

    let result = orchestrator(&ai, &search, &test_config()).run(&vxlan_entry()).await;

    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.reason.starts_with("intent analysis failed"));
    assert!(result.is_intent_failure());
    assert_eq!(result.iterations, 0);
    assert_eq!(ai.call_count(WRITER_KEY), 0);
    assert!(search.get_calls().is_empty());
}

#[tokio::test]
async fn test_every_generation_failing_fails_the_run() {
    let ai = scripted_ai();
    ai.add_error(WRITER_KEY, ModelErrorKind::Transport);
    let search = MockSearchProvider::new();

    let result = orchestrator(&ai, &search, &test_config()).run(&vxlan_entry()).await;

    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.reason.starts_with(GENERATION_FAILED_REASON));
    assert!(result.draft.is_none());
    assert!(!result.is_intent_failure());
    assert_eq!(result.iterations, 3);
    assert_eq!(ai.call_count(REVIEW_KEY), 0);
}

#[tokio::test]
async fn test_generation_error_consumes_one_attempt() {
    let ai = scripted_ai();
    ai.add_error(WRITER_KEY, ModelErrorKind::Timeout);
    ai.add_response(WRITER_KEY, &passing_writer_response());
    ai.add_response(REVIEW_KEY, &passing_review());
    let search = MockSearchProvider::new();

    let result = orchestrator(&ai, &search, &test_config()).run(&vxlan_entry()).await;

    assert_eq!(result.status, RunStatus::Accepted);
    assert_eq!(result.iterations, 2);
    assert!(result.reason.starts_with("passed quality gate on attempt 2"));
}

#[tokio::test]
async fn test_review_errors_leave_draft_with_issues() {
    let ai = scripted_ai();
    ai.add_response(WRITER_KEY, &passing_writer_response());
    ai.add_error(REVIEW_KEY, ModelErrorKind::Quota);
    let search = MockSearchProvider::new();

    let result = orchestrator(&ai, &search, &test_config()).run(&vxlan_entry()).await;

    assert_eq!(result.status, RunStatus::AcceptedWithIssues);
    assert!(result.verdict.is_none());
    assert!(result.reason.contains("quality evaluation unavailable"));
}

#[tokio::test]
async fn test_intent_and_research_run_once_per_run() {
    let ai = scripted_ai();
    ai.add_response(WRITER_KEY, &passing_writer_response());
    ai.add_response(REVIEW_KEY, &failing_review());
    let search = MockSearchProvider::new();
    search.add_hits(
        "documentation",
        &[(
            "Hedgehog fabric uses VXLAN EVPN for VPC isolation between tenants",
            "https://docs.githedgehog.com/vpc",
        )],
    );

    let result = orchestrator(&ai, &search, &test_config()).run(&vxlan_entry()).await;

    assert_eq!(result.iterations, 3);
    assert_eq!(ai.call_count(INTENT_KEY), 1);
    assert_eq!(ai.call_count(SYNTHESIS_KEY), 1);
    let research = result.research.unwrap();
    assert_eq!(research.reference_urls, vec!["https://docs.githedgehog.com/vpc"]);
}

#[tokio::test]
async fn test_cancelled_run_fails_without_calls() {
    let ai = scripted_ai();
    let search = MockSearchProvider::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = orchestrator(&ai, &search, &test_config())
        .run_with_cancel(&vxlan_entry(), &cancel)
        .await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.reason, CANCELLED_REASON);
    assert!(ai.get_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_review_discards_unjudged_draft() {
    // --- 1. Arrange ---
    let ai = scripted_ai();
    ai.add_response(WRITER_KEY, &passing_writer_response());
    ai.add_delayed_response(REVIEW_KEY, Duration::from_millis(500), &passing_review());
    let search = MockSearchProvider::new();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.cancel();
    });

    // --- 2. Act ---
    let result = orchestrator(&ai, &search, &test_config())
        .run_with_cancel(&vxlan_entry(), &cancel)
        .await;

    // --- 3. Assert ---
    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.reason, CANCELLED_REASON);
    assert!(result.cancelled);
    assert!(result.draft.is_none());
    assert!(result.verdict.is_none());
    assert!(result.intent.is_some());
    assert!(!result.is_intent_failure());
    assert_eq!(ai.call_count(WRITER_KEY), 1);
}

#[tokio::test]
async fn test_cancel_before_intent_is_not_an_intent_failure() {
    let ai = scripted_ai();
    let search = MockSearchProvider::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = orchestrator(&ai, &search, &test_config())
        .run_with_cancel(&vxlan_entry(), &cancel)
        .await;

    assert!(result.cancelled);
    assert!(result.intent.is_none());
    assert!(!result.is_intent_failure());
}

#[tokio::test]
async fn test_final_review_error_drops_verdict_of_earlier_draft() {
    // --- 1. Arrange ---
    let ai = scripted_ai();
    ai.add_response(WRITER_KEY, &passing_writer_response());
    ai.add_response(REVIEW_KEY, &failing_review());
    ai.add_error(REVIEW_KEY, ModelErrorKind::Quota);
    let search = MockSearchProvider::new();

    // --- 2. Act ---
    let result = orchestrator(&ai, &search, &test_config()).run(&vxlan_entry()).await;

    // --- 3. Assert ---
    assert_eq!(result.status, RunStatus::AcceptedWithIssues);
    assert!(result.draft.is_some());
    assert!(result.verdict.is_none());
    assert!(result.reason.contains("quality evaluation unavailable"));
    assert!(!result.reason.contains("technical_accuracy score 5.00"));

    // The earlier verdict's feedback still reaches every later writer prompt.
    let writer_calls = ai.calls_matching(WRITER_KEY);
    assert_eq!(writer_calls.len(), 3);
    assert!(writer_calls[2].1.contains("technical_accuracy score 5.00"));
}
