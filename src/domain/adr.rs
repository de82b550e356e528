//! ADR documents: YAML front-matter plus Markdown body
//!
//! Architecture: Anti-Corruption Layer - raw `---` segmented text becomes a typed record
//! - The first segment is preamble and is discarded
//! - The second segment is YAML metadata parsed into `AdrFrontmatter`
//! - Everything after the second marker is body text, rejoined if the marker recurs

use crate::domain::violations::{DashboardError, DashboardResult};
use serde::{Deserialize, Serialize};

/// Marker line that delimits the front-matter block
pub const FRONTMATTER_DELIMITER: &str = "---";

/// Automated enforcement attached to an ADR
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enforcement {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub rule_id: String,
    #[serde(default)]
    pub severity: String,
}

/// Structured metadata block of an ADR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrFrontmatter {
    pub id: String,
    pub title: String,
    /// Decision category, rendered as a badge when present
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub adr_type: Option<String>,
    /// Lifecycle status (proposed, accepted, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub enforcement: Enforcement,
}

/// A parsed ADR ready for the detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdrDocument {
    pub frontmatter: AdrFrontmatter,
    /// Markdown body, trimmed
    pub body: String,
}

impl AdrDocument {
    /// Identifier declared in the front-matter
    pub fn id(&self) -> &str {
        &self.frontmatter.id
    }

    /// Badge labels in display order: id, type, status, tool, rule, severity
    pub fn badges(&self) -> Vec<String> {
        let fm = &self.frontmatter;
        let mut badges = vec![fm.id.clone()];
        if let Some(adr_type) = fm.adr_type.as_deref().filter(|t| !t.is_empty()) {
            badges.push(adr_type.to_string());
        }
        if let Some(status) = fm.status.as_deref().filter(|s| !s.is_empty()) {
            badges.push(status.to_string());
        }
        badges.push(format!("tool: {}", fm.enforcement.tool));
        badges.push(format!("rule_id: {}", fm.enforcement.rule_id));
        badges.push(format!("severity: {}", fm.enforcement.severity));
        badges
    }
}

/// Split raw ADR text into front-matter and body.
///
/// Fewer than three `---` segments, or front-matter that is not a valid
/// ADR mapping, is a `MalformedDocument` error.
pub fn parse_adr(raw: &str) -> DashboardResult<AdrDocument> {
    let segments: Vec<&str> = raw.split(FRONTMATTER_DELIMITER).collect();
    if segments.len() < 3 {
        return Err(DashboardError::malformed(format!(
            "expected front-matter between '{FRONTMATTER_DELIMITER}' markers, found {} segment{}",
            segments.len(),
            if segments.len() == 1 { "" } else { "s" }
        )));
    }

    let frontmatter: AdrFrontmatter = serde_yaml::from_str(segments[1])
        .map_err(|e| DashboardError::malformed(format!("invalid front-matter: {e}")))?;

    let body = segments[2..].join(FRONTMATTER_DELIMITER).trim().to_string();

    Ok(AdrDocument { frontmatter, body })
}
