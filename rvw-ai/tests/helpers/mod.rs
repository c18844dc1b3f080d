//! Test Helper Utilities
//!
//! Shared utilities for testing rvw-ai

#![allow(dead_code)]

pub mod log_capture;

pub use log_capture::{capture_logs, LogCapture};

use async_trait::async_trait;
use rvw_ai::models::InputRecord;
use rvw_ai::types::{CompletionService, ServiceRequest, TransportError};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Completion service that replays a fixed script, one entry per call
///
/// Every request is kept so tests can inspect what each batch sent.
pub struct ScriptedService {
    responses: Mutex<VecDeque<Result<String, TransportError>>>,
    requests: Mutex<Vec<ServiceRequest>>,
}

impl ScriptedService {
    pub fn new(responses: Vec<Result<String, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<ServiceRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ServiceRequest) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("script exhausted".to_string())))
    }
}

/// One record per identifier, each with a single comment
pub fn records(identifiers: &[&str]) -> Vec<InputRecord> {
    identifiers
        .iter()
        .map(|id| InputRecord::new(*id, vec![format!("comment about {}", id)], 20))
        .collect()
}

/// Well-formed service answer for the given `(identifier, analysis)` pairs
pub fn results_response(pairs: &[(&str, &str)]) -> String {
    let inner: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(id, text)| (id.to_string(), serde_json::Value::String(text.to_string())))
        .collect();
    serde_json::json!({ "results": inner }).to_string()
}
