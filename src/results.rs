//! Result cache and hit presentation
//!
//! The cache is the session's only record store: it maps record ids to the
//! full `_source` documents of the hits currently on screen, and is rebuilt
//! from scratch on every successful search so stale entries cannot survive a
//! newer response. Detail views and similarity seeds read from it without
//! touching the network.
//!
//! Everything below the cache is pure presentation: turning a [`Hit`] into a
//! display card and a cached record into generic label/value rows. Keeping
//! these free of terminal code makes them directly testable.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::http::Hit;

/// Longest body excerpt shown on a result card, in characters
const SNIPPET_LIMIT: usize = 280;

/// Timestamp format the backend indexes (`10-07-2016 23:27:00`)
const PUBLISHED_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

/// In-memory record store for the current result set
#[derive(Debug, Default)]
pub struct ResultCache {
    records: HashMap<String, Map<String, Value>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire cache with the records of `hits`.
    ///
    /// This is a replacement, never a merge: after the call the cache holds
    /// exactly the ids present in `hits`.
    pub fn rebuild(&mut self, hits: &[Hit]) {
        self.records.clear();
        for hit in hits {
            self.records.insert(hit.id.clone(), hit.source.clone());
        }
    }

    /// Look up a record, reporting a cache miss as [`Error::NotFound`]
    pub fn record(&self, id: &str) -> Result<&Map<String, Value>> {
        self.records
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Display title of a cached record, if the record and field exist
    pub fn title(&self, id: &str) -> Option<&str> {
        self.records
            .get(id)
            .and_then(|record| record.get("link_name"))
            .and_then(Value::as_str)
    }

    /// Evict one record; returns whether it was present
    pub fn remove(&mut self, id: &str) -> bool {
        self.records.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Everything a result card displays for one hit
#[derive(Debug, Clone, PartialEq)]
pub struct HitCard {
    pub id: String,
    /// Relevance score, fixed two-decimal formatting
    pub score: String,
    /// Post type, "N/A" when absent
    pub kind: String,
    /// Published date, formatted for display
    pub published: String,
    /// Title, "Untitled Post" when absent
    pub title: String,
    pub snippet: String,
}

/// Build the display card for a hit
pub fn summarize(hit: &Hit) -> HitCard {
    HitCard {
        id: hit.id.clone(),
        score: format!("{:.2}", hit.score),
        kind: str_field(&hit.source, "status_type")
            .unwrap_or("N/A")
            .to_string(),
        published: str_field(&hit.source, "status_published")
            .map(format_published)
            .unwrap_or_else(|| "N/A".to_string()),
        title: str_field(&hit.source, "link_name")
            .unwrap_or("Untitled Post")
            .to_string(),
        snippet: snippet_for(hit),
    }
}

fn str_field<'a>(source: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    source.get(key).and_then(Value::as_str)
}

/// Snippet preference order: backend highlight, then a truncated body
/// excerpt, then a fixed placeholder.
fn snippet_for(hit: &Hit) -> String {
    if let Some(fragment) = hit.highlight_fragment() {
        return fragment.to_string();
    }
    match str_field(&hit.source, "status_message") {
        Some(body) => {
            let mut snippet: String = body.chars().take(SNIPPET_LIMIT).collect();
            snippet.push_str("...");
            snippet
        }
        None => "No content available.".to_string(),
    }
}

/// Format an indexed timestamp for display. Unparseable values are shown
/// verbatim rather than dropped.
fn format_published(raw: &str) -> String {
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, PUBLISHED_FORMAT) {
        return parsed.format("%b %e, %Y").to_string();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%b %e, %Y").to_string();
    }
    raw.to_string()
}

/// One label/value row of the detail view
#[derive(Debug, Clone, PartialEq)]
pub struct DetailField {
    pub label: String,
    pub value: String,
    /// Whether the value should be presented as an outbound link
    pub is_url: bool,
}

/// Overlay title for a record: its display title, or a generic fallback
pub fn overlay_title(record: &Map<String, Value>) -> String {
    str_field(record, "link_name")
        .unwrap_or("Post Details")
        .to_string()
}

/// Flatten a record into generic display rows.
///
/// Keys are humanized, nulls become "N/A", and string values that look like
/// URLs are flagged so the renderer can style them as links. The record's
/// schema is otherwise opaque.
pub fn detail_fields(record: &Map<String, Value>) -> Vec<DetailField> {
    record
        .iter()
        .map(|(key, value)| {
            let (value, is_url) = match value {
                Value::Null => ("N/A".to_string(), false),
                Value::String(s) => (s.clone(), s.starts_with("http")),
                other => (other.to_string(), false),
            };
            DetailField {
                label: humanize_key(key),
                value,
                is_url,
            }
        })
        .collect()
}

/// Turn a snake_case field name into a spaced, word-capitalized label
pub fn humanize_key(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
