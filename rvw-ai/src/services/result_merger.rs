//! Result Merging for the batch pipeline
//!
//! Folds one batch's [`ParseOutcome`] into the running aggregate.
//! Merge strategy: later batches overwrite earlier values for the same
//! identifier (last-write-wins); within a batch, keys keep response order.

use crate::models::{AggregateResult, Diagnostic, DiagnosticKind};
use serde_json::Value;

use super::recovery_parser::ParseOutcome;

/// What one merge did to the aggregate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Identifiers added for the first time
    pub inserted: usize,
    /// Identifiers that replaced an earlier batch's value
    pub overwritten: usize,
    /// Kind of diagnostic recorded instead of analyses, if any
    pub diagnostic: Option<DiagnosticKind>,
}

/// Merge one batch outcome into `aggregate`
pub fn merge(aggregate: &mut AggregateResult, batch_index: usize, outcome: ParseOutcome) -> MergeReport {
    let mut report = MergeReport::default();

    match outcome {
        ParseOutcome::Success(Value::Object(mapping)) => {
            for (identifier, value) in mapping {
                let text = analysis_text(value);
                match aggregate.insert_analysis(identifier.clone(), text) {
                    Some(_) => {
                        tracing::warn!(
                            batch = batch_index,
                            identifier = %identifier,
                            "Identifier already analyzed in an earlier batch, keeping the newer value"
                        );
                        report.overwritten += 1;
                    }
                    None => report.inserted += 1,
                }
            }
        }
        ParseOutcome::Success(other) => {
            let shape = shape_name(&other);
            tracing::warn!(batch = batch_index, shape = shape, "Parsed response is not a mapping");
            aggregate.insert_diagnostic(Diagnostic::with_excerpt(
                DiagnosticKind::Shape,
                format!("expected a mapping of identifiers, got {}", shape),
                &other.to_string(),
                batch_index,
            ));
            report.diagnostic = Some(DiagnosticKind::Shape);
        }
        ParseOutcome::Diagnostic(diagnostic) => {
            report.diagnostic = Some(diagnostic.kind);
            aggregate.insert_diagnostic(diagnostic);
        }
    }

    report
}

/// Strings are kept verbatim; any other JSON value as compact JSON text
fn analysis_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
