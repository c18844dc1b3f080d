//! Aggregate analysis result and diagnostic entries
//!
//! The aggregate is an insertion-ordered map. Product identifiers and
//! diagnostic entries live under different [`EntryKey`] variants, so a
//! diagnostic can never overwrite an analysis (or the reverse) even when a
//! product happens to be named like a diagnostic label.
//!
//! Serialized form keeps the two apart as well:
//! `{"results": {identifier: text}, "diagnostics": {batch: diagnostic}}`.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeStruct, Serializer};
use std::fmt;
use uuid::Uuid;

/// Cap on the sanitized text kept in a diagnostic, in characters
pub const RAW_EXCERPT_LIMIT: usize = 4000;

/// Prefix of rendered diagnostic labels
pub const DIAGNOSTIC_LABEL_PREFIX: &str = "⚠️ batch ";

/// Serialized field holding identifier → analysis text
pub const RESULTS_FIELD: &str = "results";

/// Serialized field holding batch number → diagnostic
pub const DIAGNOSTICS_FIELD: &str = "diagnostics";

/// Failure classification carried by a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Malformed structured text
    Syntax,
    /// Structured text ended early (includes empty input)
    Eof,
    /// Structurally valid but semantically rejected by the parser
    Data,
    /// Parser-level I/O failure
    Io,
    /// The completion service call failed
    Transport,
    /// Parsed value is not a mapping of identifiers
    Shape,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::Eof => "eof",
            DiagnosticKind::Data => "data",
            DiagnosticKind::Io => "io",
            DiagnosticKind::Transport => "transport",
            DiagnosticKind::Shape => "shape",
        }
    }
}

impl From<serde_json::error::Category> for DiagnosticKind {
    fn from(category: serde_json::error::Category) -> Self {
        use serde_json::error::Category;
        match category {
            Category::Syntax => DiagnosticKind::Syntax,
            Category::Eof => DiagnosticKind::Eof,
            Category::Data => DiagnosticKind::Data,
            Category::Io => DiagnosticKind::Io,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder recorded for a batch whose result could not be recovered
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Sanitized response text, at most [`RAW_EXCERPT_LIMIT`] characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_excerpt: Option<String>,
    /// 1-based batch number
    pub batch_index: usize,
}

impl Diagnostic {
    /// Diagnostic with a truncated excerpt of the offending text
    pub fn with_excerpt(
        kind: DiagnosticKind,
        message: impl Into<String>,
        text: &str,
        batch_index: usize,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            raw_excerpt: Some(excerpt(text)),
            batch_index,
        }
    }

    /// Diagnostic for a failed service call (no response text exists)
    pub fn transport(batch_index: usize, error: &impl fmt::Display) -> Self {
        Self {
            kind: DiagnosticKind::Transport,
            message: error.to_string(),
            raw_excerpt: None,
            batch_index,
        }
    }

    /// Label this diagnostic is stored under
    pub fn key(&self) -> EntryKey {
        EntryKey::Batch(self.batch_index)
    }
}

/// First [`RAW_EXCERPT_LIMIT`] characters of `text`
pub fn excerpt(text: &str) -> String {
    text.chars().take(RAW_EXCERPT_LIMIT).collect()
}

/// Key of an aggregate entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    /// Product identifier from the service response
    Identifier(String),
    /// Diagnostic slot for a 1-based batch number
    Batch(usize),
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Identifier(id) => f.write_str(id),
            EntryKey::Batch(index) => write!(f, "{}{}", DIAGNOSTIC_LABEL_PREFIX, index),
        }
    }
}

/// Value of an aggregate entry
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum AggregateEntry {
    Analysis(String),
    Diagnostic(Diagnostic),
}

/// Identifier → analysis text, plus one diagnostic per failed batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    entries: IndexMap<EntryKey, AggregateEntry>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an analysis; returns the replaced text, if any
    ///
    /// Overwriting keeps the key's original position.
    pub fn insert_analysis(&mut self, identifier: impl Into<String>, text: impl Into<String>) -> Option<String> {
        let previous = self.entries.insert(
            EntryKey::Identifier(identifier.into()),
            AggregateEntry::Analysis(text.into()),
        );
        match previous {
            Some(AggregateEntry::Analysis(old)) => Some(old),
            _ => None,
        }
    }

    /// Record a diagnostic under its batch label
    pub fn insert_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.entries
            .insert(diagnostic.key(), AggregateEntry::Diagnostic(diagnostic));
    }

    /// Analysis text for an identifier
    pub fn analysis(&self, identifier: &str) -> Option<&str> {
        match self.entries.get(&EntryKey::Identifier(identifier.to_string())) {
            Some(AggregateEntry::Analysis(text)) => Some(text),
            _ => None,
        }
    }

    /// Diagnostic recorded for a 1-based batch number
    pub fn diagnostic(&self, batch_index: usize) -> Option<&Diagnostic> {
        match self.entries.get(&EntryKey::Batch(batch_index)) {
            Some(AggregateEntry::Diagnostic(diagnostic)) => Some(diagnostic),
            _ => None,
        }
    }

    /// Analyses in insertion order
    pub fn analyses(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(key, entry)| match (key, entry) {
            (EntryKey::Identifier(id), AggregateEntry::Analysis(text)) => Some((id.as_str(), text.as_str())),
            _ => None,
        })
    }

    /// Diagnostics in insertion order
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.values().filter_map(|entry| match entry {
            AggregateEntry::Diagnostic(diagnostic) => Some(diagnostic),
            AggregateEntry::Analysis(_) => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryKey, &AggregateEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct AnalysesView<'a>(&'a AggregateResult);

impl Serialize for AnalysesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (identifier, text) in self.0.analyses() {
            map.serialize_entry(identifier, text)?;
        }
        map.end()
    }
}

struct DiagnosticsView<'a>(&'a AggregateResult);

impl Serialize for DiagnosticsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for diagnostic in self.0.diagnostics() {
            map.serialize_entry(&diagnostic.batch_index, diagnostic)?;
        }
        map.end()
    }
}

impl Serialize for AggregateResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AggregateResult", 2)?;
        state.serialize_field(RESULTS_FIELD, &AnalysesView(self))?;
        state.serialize_field(DIAGNOSTICS_FIELD, &DiagnosticsView(self))?;
        state.end()
    }
}

#[derive(serde::Deserialize)]
struct AggregateWire {
    #[serde(default)]
    results: IndexMap<String, String>,
    #[serde(default)]
    diagnostics: IndexMap<usize, Diagnostic>,
}

impl<'de> Deserialize<'de> for AggregateResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = AggregateWire::deserialize(deserializer)?;
        let mut aggregate = AggregateResult::new();
        for (identifier, text) in wire.results {
            aggregate.insert_analysis(identifier, text);
        }
        for (batch_index, diagnostic) in wire.diagnostics {
            if diagnostic.batch_index != batch_index {
                return Err(de::Error::custom(format!(
                    "diagnostic under batch {} carries batch_index {}",
                    batch_index, diagnostic.batch_index
                )));
            }
            aggregate.insert_diagnostic(diagnostic);
        }
        Ok(aggregate)
    }
}

/// Counters for one orchestrator run
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records: usize,
    pub batches: usize,
    /// Batches whose response merged as a mapping
    pub succeeded: usize,
    pub transport_failures: usize,
    pub parse_failures: usize,
    pub shape_mismatches: usize,
    /// Identifiers that replaced a value from an earlier batch
    pub overwritten: usize,
}

impl RunSummary {
    pub fn new(records: usize, batches: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            records,
            batches,
            succeeded: 0,
            transport_failures: 0,
            parse_failures: 0,
            shape_mismatches: 0,
            overwritten: 0,
        }
    }

    /// Batches that ended up as a diagnostic entry
    pub fn failed(&self) -> usize {
        self.transport_failures + self.parse_failures + self.shape_mismatches
    }
}
