//! Batch orchestration
//!
//! Partitions records into fixed-size batches and runs them strictly in
//! order: build request → call service → recover → merge. Nothing that goes
//! wrong inside a batch escapes it; transport and parse failures become
//! diagnostic entries keyed by batch number and the run continues.
//!
//! Batches are numbered from 1. The aggregate is owned by the run and only
//! handed out once every batch has been processed.

use crate::models::{AggregateResult, Diagnostic, DiagnosticKind, InputRecord, RunSummary};
use crate::types::CompletionService;
use chrono::Utc;
use rvw_common::{Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

use super::prompt_builder;
use super::recovery_parser::RecoveryParser;
use super::result_merger;

/// Contiguous slice of the input processed by one service call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    /// 1-based batch number
    pub index: usize,
    pub records: &'a [InputRecord],
}

/// Split `records` into consecutive batches of at most `batch_size`
///
/// Yields `ceil(len / batch_size)` batches in input order; only the last
/// may be short. `batch_size` must be positive.
pub fn partition(records: &[InputRecord], batch_size: usize) -> Vec<Batch<'_>> {
    records
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(i, records)| Batch { index: i + 1, records })
        .collect()
}

/// Aggregate plus run counters
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub result: AggregateResult,
    pub summary: RunSummary,
}

/// Batch orchestrator
pub struct BatchOrchestrator {
    service: Arc<dyn CompletionService>,
    parser: RecoveryParser,
    batch_size: usize,
}

impl BatchOrchestrator {
    /// Create an orchestrator for a service and batch size
    ///
    /// # Errors
    /// `InvalidInput` if `batch_size` is zero
    pub fn new(service: Arc<dyn CompletionService>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidInput("batch_size must be at least 1".to_string()));
        }
        Ok(Self {
            service,
            parser: RecoveryParser::default(),
            batch_size,
        })
    }

    /// Replace the default recovery parser
    pub fn with_parser(mut self, parser: RecoveryParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Run all batches and return the aggregate
    pub async fn run(&self, records: &[InputRecord]) -> AggregateResult {
        self.run_with_summary(records).await.result
    }

    /// Run all batches and return the aggregate with run counters
    pub async fn run_with_summary(&self, records: &[InputRecord]) -> AnalysisRun {
        let batches = partition(records, self.batch_size);
        let mut summary = RunSummary::new(records.len(), batches.len());
        let mut aggregate = AggregateResult::new();

        info!(
            run_id = %summary.run_id,
            service = self.service.name(),
            records = records.len(),
            batches = batches.len(),
            batch_size = self.batch_size,
            "Starting analysis run"
        );

        for batch in batches {
            let request = prompt_builder::build_request(batch.records);

            let raw = match self.service.complete(&request).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(
                        run_id = %summary.run_id,
                        batch = batch.index,
                        error = %e,
                        "Service call failed, continuing with next batch"
                    );
                    aggregate.insert_diagnostic(Diagnostic::transport(batch.index, &e));
                    summary.transport_failures += 1;
                    continue;
                }
            };

            let outcome = self.parser.parse(&raw, batch.index);
            let report = result_merger::merge(&mut aggregate, batch.index, outcome);
            summary.overwritten += report.overwritten;

            match report.diagnostic {
                None => {
                    summary.succeeded += 1;
                    info!(
                        run_id = %summary.run_id,
                        batch = batch.index,
                        records = batch.records.len(),
                        analyses = report.inserted + report.overwritten,
                        "Batch merged"
                    );
                }
                Some(DiagnosticKind::Shape) => summary.shape_mismatches += 1,
                Some(_) => summary.parse_failures += 1,
            }
        }

        summary.finished_at = Some(Utc::now());
        info!(
            run_id = %summary.run_id,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            entries = aggregate.len(),
            "Analysis run complete"
        );

        AnalysisRun {
            result: aggregate,
            summary,
        }
    }
}
