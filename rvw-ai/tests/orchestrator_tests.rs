//! Batch orchestrator integration tests
//!
//! Drives full runs against a scripted completion service:
//! - failure isolation (transport and parse failures stay in their batch)
//! - last-write-wins across batches
//! - partitioning and request payloads
//! - run summary counters and warning logs

mod helpers;

use helpers::{capture_logs, records, results_response, ScriptedService};
use rvw_ai::models::{DiagnosticKind, EntryKey};
use rvw_ai::services::{prompt_builder, BatchOrchestrator};
use rvw_ai::types::TransportError;
use std::sync::Arc;
use tracing::Level;

#[tokio::test]
async fn test_transport_failure_is_isolated_to_its_batch() {
    // Batch 1 = [A, A2] fails in transport, batch 2 = [B] succeeds
    let service = Arc::new(ScriptedService::new(vec![
        Err(TransportError::Network("connection refused".to_string())),
        Ok(results_response(&[("B", "محصول خوبی است")])),
    ]));
    let orchestrator = BatchOrchestrator::new(service.clone(), 2).unwrap();

    let result = orchestrator.run(&records(&["A", "A2", "B"])).await;

    assert_eq!(result.len(), 2);
    assert_eq!(result.diagnostics().count(), 1);

    let diagnostic = result.diagnostic(1).unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::Transport);
    assert_eq!(diagnostic.message, "Network error: connection refused");
    assert!(diagnostic.raw_excerpt.is_none());

    assert_eq!(result.analysis("B"), Some("محصول خوبی است"));
    assert_eq!(result.analysis("A"), None);
    assert_eq!(result.analysis("A2"), None);
    assert_eq!(service.call_count(), 2);
}

#[tokio::test]
async fn test_unrecoverable_response_keeps_other_batches() {
    let service = Arc::new(ScriptedService::new(vec![
        Ok(results_response(&[("A", "first")])),
        Ok("I'm sorry, I cannot produce JSON today.".to_string()),
        Ok("```json\n{results: {'C': 'third',}}\n```".to_string()),
    ]));
    let orchestrator = BatchOrchestrator::new(service, 1).unwrap();

    let run = orchestrator.run_with_summary(&records(&["A", "B", "C"])).await;

    assert_eq!(run.result.analysis("A"), Some("first"));
    assert_eq!(run.result.analysis("C"), Some("third"));

    let diagnostic = run.result.diagnostic(2).unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::Syntax);
    assert_eq!(
        diagnostic.raw_excerpt.as_deref(),
        Some("I\"m sorry, I cannot produce JSON today.")
    );

    assert_eq!(run.summary.batches, 3);
    assert_eq!(run.summary.succeeded, 2);
    assert_eq!(run.summary.parse_failures, 1);
    assert_eq!(run.summary.transport_failures, 0);
    assert!(run.summary.finished_at.is_some());
}

#[tokio::test]
async fn test_blank_reply_is_parse_failure() {
    let service = Arc::new(ScriptedService::new(vec![
        Ok("   ".to_string()),
        Ok(results_response(&[("B", "خوب")])),
    ]));
    let orchestrator = BatchOrchestrator::new(service, 1).unwrap();

    let run = orchestrator.run_with_summary(&records(&["A", "B"])).await;

    let diagnostic = run.result.diagnostic(1).unwrap();
    assert_eq!(diagnostic.kind, DiagnosticKind::Eof);
    assert_eq!(diagnostic.raw_excerpt.as_deref(), Some(""));
    assert_eq!(run.result.analysis("B"), Some("خوب"));
    assert_eq!(run.summary.parse_failures, 1);
    assert_eq!(run.summary.transport_failures, 0);
}

#[tokio::test]
async fn test_duplicate_identifier_later_batch_wins() {
    let service = Arc::new(ScriptedService::new(vec![
        Ok(results_response(&[("A", "old"), ("X", "x")])),
        Ok(results_response(&[("A", "new")])),
    ]));
    let orchestrator = BatchOrchestrator::new(service, 2).unwrap();

    let run = orchestrator.run_with_summary(&records(&["A", "X", "A"])).await;

    assert_eq!(run.result.analysis("A"), Some("new"));
    assert_eq!(run.summary.overwritten, 1);

    // Overwritten key keeps its first position
    let keys: Vec<_> = run.result.analyses().map(|(id, _)| id).collect();
    assert_eq!(keys, vec!["A", "X"]);
}

#[tokio::test]
async fn test_entries_follow_batch_order() {
    let service = Arc::new(ScriptedService::new(vec![
        Ok(results_response(&[("b1", "1"), ("a1", "2")])),
        Err(TransportError::Api(500, "model not loaded".to_string())),
        Ok(results_response(&[("c3", "3")])),
    ]));
    let orchestrator = BatchOrchestrator::new(service, 2).unwrap();

    let result = orchestrator.run(&records(&["b1", "a1", "x", "y", "c3"])).await;

    let keys: Vec<_> = result.iter().map(|(key, _)| key.clone()).collect();
    assert_eq!(
        keys,
        vec![
            EntryKey::Identifier("b1".to_string()),
            EntryKey::Identifier("a1".to_string()),
            EntryKey::Batch(2),
            EntryKey::Identifier("c3".to_string()),
        ]
    );
    assert_eq!(result.diagnostic(2).unwrap().message, "API error 500: model not loaded");
}

#[tokio::test]
async fn test_one_request_per_batch_with_batch_payload() {
    let service = Arc::new(ScriptedService::new(vec![
        Ok(results_response(&[])),
        Ok(results_response(&[])),
        Ok(results_response(&[])),
    ]));
    let orchestrator = BatchOrchestrator::new(service.clone(), 2).unwrap();
    let input = records(&["p1", "p2", "p3", "p4", "p5"]);

    orchestrator.run(&input).await;

    let requests = service.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(
        requests[0].user,
        format!(
            "{}\n{}",
            prompt_builder::PAYLOAD_HEADING,
            prompt_builder::batch_payload(&input[0..2])
        )
    );
    assert!(requests[2].user.contains("\"p5\""));
    assert!(!requests[2].user.contains("\"p4\""));
    assert!(requests.iter().all(|r| r.system == prompt_builder::SYSTEM_INSTRUCTION));
}

#[tokio::test]
async fn test_list_response_recorded_as_shape_diagnostic() {
    let service = Arc::new(ScriptedService::new(vec![Ok(r#"{"results": ["A", "B"]}"#.to_string())]));
    let orchestrator = BatchOrchestrator::new(service, 4).unwrap();

    let run = orchestrator.run_with_summary(&records(&["A", "B"])).await;

    assert_eq!(run.result.analyses().count(), 0);
    assert_eq!(run.result.diagnostic(1).unwrap().kind, DiagnosticKind::Shape);
    assert_eq!(run.summary.shape_mismatches, 1);
    assert_eq!(run.summary.failed(), 1);
}

#[tokio::test]
async fn test_empty_input_makes_no_calls() {
    let service = Arc::new(ScriptedService::new(vec![]));
    let orchestrator = BatchOrchestrator::new(service.clone(), 4).unwrap();

    let run = orchestrator.run_with_summary(&[]).await;

    assert!(run.result.is_empty());
    assert_eq!(run.summary.batches, 0);
    assert_eq!(service.call_count(), 0);
}

#[test]
fn test_zero_batch_size_rejected() {
    let service = Arc::new(ScriptedService::new(vec![]));
    assert!(BatchOrchestrator::new(service, 0).is_err());
}

#[tokio::test]
async fn test_transport_failure_logged_as_warning() {
    let (logs, _guard) = capture_logs();
    let service = Arc::new(ScriptedService::new(vec![Err(TransportError::EmptyResponse)]));
    let orchestrator = BatchOrchestrator::new(service, 4).unwrap();

    orchestrator.run(&records(&["A"])).await;

    assert_eq!(logs.count_at(Level::WARN, "Service call failed"), 1);
    logs.assert_contains("Analysis run complete");
}
