//! Tolerant parsing of model responses
//!
//! Three tiers:
//! 1. Strict JSON parse of the sanitized text
//! 2. Key repair (quote bare identifiers used as keys, re-strip trailing
//!    commas) and a second strict parse
//! 3. A [`Diagnostic`] describing the failure, with a bounded excerpt
//!
//! A value wrapped as `{"results": ...}` is unwrapped; anything else is
//! returned as parsed. Shape checks belong to the merger.

use crate::models::{Diagnostic, DiagnosticKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::text_sanitizer::{strip_trailing_commas, TextSanitizer};

/// Reserved top-level key the service is asked to wrap its answer in
pub const RESULTS_KEY: &str = "results";

/// Bare identifier used as a key: `{name:` or `, name :`
static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([{,]\s*)([A-Za-z0-9_]+)\s*:").expect("valid regex"));

/// Result of parsing one raw response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum ParseOutcome {
    /// Parsed value, `results` wrapper removed
    Success(Value),
    /// Unrecoverable response
    Diagnostic(Diagnostic),
}

impl ParseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ParseOutcome::Success(_))
    }
}

/// Recovery parser
#[derive(Debug, Clone, Default)]
pub struct RecoveryParser {
    sanitizer: TextSanitizer,
}

impl RecoveryParser {
    pub fn new(sanitizer: TextSanitizer) -> Self {
        Self { sanitizer }
    }

    /// Parse a raw response produced for the 1-based batch `batch_index`
    pub fn parse(&self, raw: &str, batch_index: usize) -> ParseOutcome {
        let text = self.sanitizer.sanitize(raw);

        let strict_error = match serde_json::from_str::<Value>(&text) {
            Ok(value) => return ParseOutcome::Success(unwrap_results(value)),
            Err(e) => e,
        };

        tracing::debug!(
            batch = batch_index,
            error = %strict_error,
            "Strict parse failed, retrying with key repair"
        );

        let repaired = repair_keys(&text);
        match serde_json::from_str::<Value>(&repaired) {
            Ok(value) => {
                tracing::debug!(batch = batch_index, "Key repair recovered response");
                ParseOutcome::Success(unwrap_results(value))
            }
            Err(e) => {
                let kind = DiagnosticKind::from(e.classify());
                tracing::warn!(
                    batch = batch_index,
                    kind = %kind,
                    error = %e,
                    "Response could not be recovered"
                );
                ParseOutcome::Diagnostic(Diagnostic::with_excerpt(
                    kind,
                    format!("{} error: {}", kind, e),
                    &text,
                    batch_index,
                ))
            }
        }
    }
}

/// Quote bare keys, then drop trailing commas the substitution may expose
pub fn repair_keys(text: &str) -> String {
    let quoted = BARE_KEY.replace_all(text, "${1}\"${2}\":");
    strip_trailing_commas(&quoted)
}

/// `{"results": X}` → `X`; everything else unchanged
fn unwrap_results(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove(RESULTS_KEY) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    }
}
