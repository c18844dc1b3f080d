//! Data models for the analysis pipeline

pub mod analysis_result;
pub mod input_record;

pub use analysis_result::{
    AggregateEntry, AggregateResult, Diagnostic, DiagnosticKind, EntryKey, RunSummary,
    DIAGNOSTICS_FIELD, DIAGNOSTIC_LABEL_PREFIX, RAW_EXCERPT_LIMIT, RESULTS_FIELD,
};
pub use input_record::{group_comments, parse_records_json, InputRecord, DEFAULT_MAX_COMMENTS};
