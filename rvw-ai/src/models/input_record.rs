//! Input records: one identifier plus its bounded list of comments

use rvw_common::{Error, Result};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default cap on comments kept per identifier
pub const DEFAULT_MAX_COMMENTS: usize = 20;

/// Grouped input for one product
///
/// Serialized as `{"product": ..., "comments": [...]}`, which is also the
/// shape embedded in the service request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    #[serde(rename = "product")]
    pub identifier: String,
    pub comments: Vec<String>,
}

impl InputRecord {
    /// Create a record, keeping at most `max_comments` comments
    pub fn new(identifier: impl Into<String>, mut comments: Vec<String>, max_comments: usize) -> Self {
        comments.truncate(max_comments);
        Self {
            identifier: identifier.into(),
            comments,
        }
    }
}

/// Group `(identifier, comment)` rows into records
///
/// Records come out in sorted identifier order. Blank comments are dropped,
/// each record keeps its first `max_comments` comments in row order, and
/// identifiers left with no comments produce no record.
pub fn group_comments<I, K, C>(rows: I, max_comments: usize) -> Vec<InputRecord>
where
    I: IntoIterator<Item = (K, C)>,
    K: Into<String>,
    C: Into<String>,
{
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (identifier, comment) in rows {
        let comments = groups.entry(identifier.into()).or_default();
        let comment = comment.into();
        if comment.trim().is_empty() || comments.len() >= max_comments {
            continue;
        }
        comments.push(comment);
    }

    groups
        .into_iter()
        .filter(|(_, comments)| !comments.is_empty())
        .map(|(identifier, comments)| InputRecord::new(identifier, comments, max_comments))
        .collect()
}

/// Accepted shapes for one element of an input JSON array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputEntry {
    Grouped {
        #[serde(deserialize_with = "product_identifier")]
        product: String,
        comments: Vec<String>,
    },
    Row {
        #[serde(deserialize_with = "product_identifier")]
        product: String,
        comment: Option<String>,
    },
}

/// Product ids may be strings or numbers; numbers keep their JSON text
fn product_identifier<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(identifier) => Ok(identifier),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(de::Error::custom(format!(
            "product must be a string or a number, got {}",
            other
        ))),
    }
}

/// Parse a JSON array of grouped records and/or single-comment rows
///
/// Both `{"product", "comments": [...]}` and `{"product", "comment"}`
/// elements are accepted; everything is regrouped through
/// [`group_comments`] so an identifier appears in exactly one record.
pub fn parse_records_json(text: &str, max_comments: usize) -> Result<Vec<InputRecord>> {
    let entries: Vec<InputEntry> = serde_json::from_str(text)
        .map_err(|e| Error::InvalidInput(format!("Input is not a JSON array of records: {}", e)))?;

    let rows = entries.into_iter().flat_map(|entry| match entry {
        InputEntry::Grouped { product, comments } => comments
            .into_iter()
            .map(|comment| (product.clone(), comment))
            .collect::<Vec<_>>(),
        InputEntry::Row { product, comment } => vec![(product, comment.unwrap_or_default())],
    });

    Ok(group_comments(rows, max_comments))
}
