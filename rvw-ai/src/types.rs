//! Core Types and Trait Definitions for RVW-AI
//!
//! Defines the seam between the batch pipeline and the external
//! generative-text service:
//! - [`ServiceRequest`]: system instruction + user payload for one batch
//! - [`CompletionService`]: one stateless request/response exchange
//! - [`TransportError`]: everything that can go wrong before a response
//!   body is available

use async_trait::async_trait;
use thiserror::Error;

/// One request to the completion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    /// Fixed instruction describing the task and the required output shape
    pub system: String,
    /// Serialized batch payload
    pub user: String,
}

/// Completion service failure
///
/// Scoped to a single batch; the orchestrator records it as a diagnostic
/// entry and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty response from model")]
    EmptyResponse,
}

/// External generative-text service
///
/// Implementations return the raw text of the model's answer. Nothing about
/// the text is guaranteed; recovery happens downstream.
///
/// # Example
/// ```rust,ignore
/// use rvw_ai::types::{CompletionService, ServiceRequest, TransportError};
///
/// pub struct EchoService;
///
/// #[async_trait::async_trait]
/// impl CompletionService for EchoService {
///     fn name(&self) -> &str { "echo" }
///
///     async fn complete(&self, request: &ServiceRequest) -> Result<String, TransportError> {
///         Ok(request.user.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Service name for logging
    fn name(&self) -> &str;

    /// Send one request and return the raw response text
    async fn complete(&self, request: &ServiceRequest) -> Result<String, TransportError>;
}
