//! rvw-ai library interface
//!
//! Recovers per-product analyses from free-text model output. Records are
//! sent to the completion service in fixed-size batches; every response goes
//! through sanitization and tolerant parsing, and per-batch failures become
//! diagnostic entries in the aggregate instead of aborting the run.

pub mod config;
pub mod models;
pub mod services;
pub mod types;

pub use crate::models::{AggregateEntry, AggregateResult, Diagnostic, DiagnosticKind, InputRecord};
pub use crate::services::{BatchOrchestrator, ParseOutcome, RecoveryParser};
pub use crate::types::{CompletionService, ServiceRequest, TransportError};
