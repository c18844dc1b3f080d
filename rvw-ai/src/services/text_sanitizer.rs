//! Text sanitization for raw model output
//!
//! Turns a raw response into the candidate string handed to the structured
//! parser. Every step is total; sanitizing already-sanitized text returns it
//! unchanged.
//!
//! **Steps (in order):**
//! 1. Remove fence markers (```` ```json ```` and ```` ``` ````)
//! 2. Narrow to the first `{` through the last `}`
//! 3. Drop characters outside the allow-list
//! 4. Remove trailing commas before `}` / `]`
//! 5. Turn unescaped single quotes into double quotes
//! 6. Trim surrounding whitespace

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::RangeInclusive;

const FENCE_OPENER: &str = "```json";
const FENCE: &str = "```";

/// Arabic block, which covers Persian script
pub const ARABIC_BLOCK: RangeInclusive<char> = '\u{0600}'..='\u{06FF}';

/// Comma (plus any further commas/whitespace) right before a closing bracket
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",[\s,]*([}\]])").expect("valid regex"));

/// Text sanitizer with a configurable set of allowed script blocks
#[derive(Debug, Clone)]
pub struct TextSanitizer {
    script_ranges: Vec<RangeInclusive<char>>,
}

impl Default for TextSanitizer {
    fn default() -> Self {
        Self {
            script_ranges: vec![ARABIC_BLOCK],
        }
    }
}

impl TextSanitizer {
    /// Sanitizer that keeps the given script blocks besides printable ASCII
    pub fn with_script_ranges(script_ranges: Vec<RangeInclusive<char>>) -> Self {
        Self { script_ranges }
    }

    /// Produce the sanitized candidate text
    pub fn sanitize(&self, raw: &str) -> String {
        let text = strip_fences(raw);
        let text = narrow_to_braces(&text);
        let text = self.filter_chars(text);
        // Dropping invisible characters can splice a new fence together
        let text = strip_fences(&text);
        let text = strip_trailing_commas(&text);
        let text = normalize_single_quotes(&text);
        text.trim().to_string()
    }

    fn is_allowed(&self, c: char) -> bool {
        matches!(c, '\t' | '\n' | '\r' | ' '..='~')
            || self.script_ranges.iter().any(|range| range.contains(&c))
    }

    fn filter_chars(&self, text: &str) -> String {
        text.chars().filter(|&c| self.is_allowed(c)).collect()
    }
}

/// Sanitize with the default allow-list
pub fn sanitize(raw: &str) -> String {
    TextSanitizer::default().sanitize(raw)
}

/// Remove fence markers until none are left
pub fn strip_fences(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = current.replace(FENCE_OPENER, "").replace(FENCE, "");
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Slice from the first `{` through the last `}`
///
/// Text without both braces is returned unchanged; a last `}` that comes
/// before the first `{` leaves nothing.
pub fn narrow_to_braces(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &text[start..=end],
        (Some(_), Some(_)) => "",
        _ => text,
    }
}

/// `,}` → `}` and `, ]` → `]`
pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Replace every `'` not preceded by a backslash with `"`
pub fn normalize_single_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    for c in text.chars() {
        if c == '\'' && prev != Some('\\') {
            out.push('"');
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}
