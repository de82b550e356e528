//! Enforced rules, reported violations and the dashboard error taxonomy
//!
//! Architecture: Snapshot Models - manifest rows and violations are plain values
//! - Each poll produces a complete snapshot that replaces the previous one
//! - Filtering by ADR is a pure derived view, recomputed on demand
//! - Errors are typed so callers decide what is recovered and what is surfaced

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One enforced rule in the repository manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// ADR identifier that owns this rule
    pub id: String,
    /// Enforcing tool (eslint, archunit, ...)
    #[serde(default, deserialize_with = "nullable_string")]
    pub tool: String,
    /// Rule identifier inside the tool
    #[serde(default, deserialize_with = "nullable_string")]
    pub rule_id: String,
    /// Severity label as declared in the ADR
    #[serde(default, deserialize_with = "nullable_string")]
    pub severity: String,
}

impl ManifestEntry {
    /// Create a new manifest entry
    pub fn new(
        id: impl Into<String>,
        tool: impl Into<String>,
        rule_id: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tool: tool.into(),
            rule_id: rule_id.into(),
            severity: severity.into(),
        }
    }

    /// Subtitle shown under the id in list views
    pub fn subtitle(&self) -> String {
        format!("{} / {}", self.tool, self.rule_id)
    }
}

/// A reported instance of code failing an ADR's rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// ADR whose rule was broken
    pub adr_id: String,
    /// File the tool reported
    pub file: String,
    /// Line number (1-indexed)
    pub line: u32,
    /// Message from the enforcing tool
    pub message: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(
        adr_id: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            adr_id: adr_id.into(),
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// Format violation for display
    pub fn format_display(&self) -> String {
        if self.file.is_empty() {
            format!("<unknown>:{} {}", self.line, self.message)
        } else {
            format!("{}:{} {}", self.file, self.line, self.message)
        }
    }
}

/// Violations reported against `selected`, in source order.
///
/// No selection yields an empty result.
pub fn filter_violations<'a>(violations: &'a [Violation], selected: Option<&str>) -> Vec<&'a Violation> {
    match selected {
        Some(adr_id) => violations.iter().filter(|v| v.adr_id == adr_id).collect(),
        None => Vec::new(),
    }
}

/// Number of violations per ADR id
pub fn count_by_adr(violations: &[Violation]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for violation in violations {
        *counts.entry(violation.adr_id.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Index manifest rows by `(tool, rule_id)` for mapping tool findings back to ADRs
pub fn index_by_rule(entries: &[ManifestEntry]) -> HashMap<(&str, &str), &str> {
    entries
        .iter()
        .map(|e| ((e.tool.as_str(), e.rule_id.as_str()), e.id.as_str()))
        .collect()
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Error types that can occur while loading dashboard data
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Network failure or non-success status from the API
    #[error("Transport error for {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// ADR document endpoint answered with a non-success status
    #[error("ADR '{adr_id}' not found (status {status})")]
    NotFound { adr_id: String, status: u16 },

    /// Delimiter or front-matter failure in an ADR document
    #[error("Malformed ADR document: {message}")]
    MalformedDocument { message: String },

    /// Payload did not have the expected shape
    #[error("Unexpected payload from {endpoint}: {message}")]
    EmptyResult { endpoint: String, message: String },

    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// SARIF report could not be read
    #[error("SARIF error: {message}")]
    Sarif { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl DashboardError {
    /// Create a transport error
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error for an ADR
    pub fn not_found(adr_id: impl Into<String>, status: u16) -> Self {
        Self::NotFound {
            adr_id: adr_id.into(),
            status,
        }
    }

    /// Create a malformed document error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Create an unexpected payload error
    pub fn empty_result(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmptyResult {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a SARIF error
    pub fn sarif(message: impl Into<String>) -> Self {
        Self::Sarif {
            message: message.into(),
        }
    }

    /// Whether the error came from the document content rather than the network
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedDocument { .. })
    }
}

/// Result type for dashboard operations
pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_violations() -> Vec<Violation> {
        vec![
            Violation::new("ADR-1", "src/a.ts", 3, "any used"),
            Violation::new("ADR-2", "src/b.ts", 9, "cycle"),
            Violation::new("ADR-1", "src/c.ts", 1, "any used again"),
        ]
    }

    #[test]
    fn test_filter_preserves_source_order() {
        let violations = sample_violations();
        let filtered = filter_violations(&violations, Some("ADR-1"));

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].file, "src/a.ts");
        assert_eq!(filtered[1].file, "src/c.ts");
    }

    #[test]
    fn test_filter_without_selection_is_empty() {
        let violations = sample_violations();
        assert!(filter_violations(&violations, None).is_empty());
        assert!(filter_violations(&violations, Some("ADR-9")).is_empty());
    }

    #[test]
    fn test_count_by_adr() {
        let violations = sample_violations();
        let counts = count_by_adr(&violations);

        assert_eq!(counts.get("ADR-1"), Some(&2));
        assert_eq!(counts.get("ADR-2"), Some(&1));
        assert_eq!(counts.get("ADR-3"), None);
    }

    #[test]
    fn test_manifest_entry_accepts_null_fields() {
        let entry: ManifestEntry =
            serde_json::from_str(r#"{"id":"ADR-7","tool":null,"rule_id":"x","severity":null}"#)
                .unwrap();

        assert_eq!(entry.id, "ADR-7");
        assert_eq!(entry.tool, "");
        assert_eq!(entry.rule_id, "x");
        assert_eq!(entry.subtitle(), " / x");
    }

    #[test]
    fn test_index_by_rule() {
        let entries = vec![
            ManifestEntry::new("ADR-1", "eslint", "no-any", "high"),
            ManifestEntry::new("ADR-2", "archunit", "ui_should_not_access_core", "medium"),
        ];
        let index = index_by_rule(&entries);

        assert_eq!(index.get(&("eslint", "no-any")), Some(&"ADR-1"));
        assert_eq!(index.get(&("eslint", "no-cycle")), None);
    }

    #[test]
    fn test_violation_display() {
        let violation = Violation::new("ADR-1", "src/a.ts", 3, "any used");
        assert_eq!(violation.format_display(), "src/a.ts:3 any used");

        let located_nowhere = Violation::new("ADR-1", "", 1, "global");
        assert_eq!(located_nowhere.format_display(), "<unknown>:1 global");
    }
}
