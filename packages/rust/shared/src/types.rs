//! Core domain types for the Kantan CMS publish pipeline.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A content collection as returned by the CMS `collections` endpoint.
///
/// Timestamps are kept as strings — the CMS wire format is not normative
/// and the pipeline never does arithmetic on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    /// Collection identifier.
    pub id: String,
    /// Display name (e.g. `Blog`), also used as the snapshot file name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Collection type discriminator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Optional ordering hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Creation timestamp as reported by the CMS.
    pub created_at: String,
    /// Last-update timestamp as reported by the CMS.
    pub updated_at: String,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A single content record: an `id` plus arbitrary CMS-defined fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    /// Record identifier, when the CMS provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// All remaining fields, preserved as-is.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

impl Record {
    /// Look up a field by name. `"id"` resolves to the record id.
    pub fn get(&self, field: &str) -> Option<Value> {
        if field == "id" {
            return self.id.clone().map(Value::String);
        }
        self.fields.get(field).cloned()
    }

    /// Whether a field is present with a usable value (not null, not `""`).
    pub fn has_value(&self, field: &str) -> bool {
        match self.get(field) {
            Some(Value::Null) | None => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

static HYPHEN_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("valid regex"));

/// Create a URL-friendly slug from arbitrary text.
///
/// Lowercases, keeps alphanumerics/spaces/hyphens, turns spaces into
/// hyphens, collapses hyphen runs, and trims leading/trailing hyphens.
pub fn create_slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let filtered: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    HYPHEN_RUNS
        .replace_all(&filtered, "-")
        .trim_matches('-')
        .to_string()
}
