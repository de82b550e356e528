//! SARIF import: map linter findings onto ADR violations
//!
//! Architecture: Anti-Corruption Layer - tool reports are translated through the manifest
//! - Only the first run of a report is read
//! - A finding maps to an ADR when `(tool, rule_id)` appears in the manifest
//! - Findings without a matching rule are dropped

use crate::domain::violations::{index_by_rule, DashboardError, DashboardResult, ManifestEntry, Violation};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct SarifLog {
    #[serde(default)]
    runs: Vec<SarifRun>,
}

#[derive(Debug, Deserialize)]
struct SarifRun {
    tool: SarifTool,
    #[serde(default)]
    results: Vec<SarifResult>,
}

#[derive(Debug, Deserialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Deserialize)]
struct SarifDriver {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: Option<String>,
    #[serde(default)]
    message: SarifMessage,
    #[serde(default)]
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Default, Deserialize)]
struct SarifMessage {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: PhysicalLocation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhysicalLocation {
    artifact_location: ArtifactLocation,
    region: Option<Region>,
}

#[derive(Debug, Deserialize)]
struct ArtifactLocation {
    #[serde(default)]
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Region {
    start_line: Option<u32>,
}

/// One result from a SARIF report, flattened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Driver name, lowercased
    pub tool: String,
    pub rule_id: Option<String>,
    /// Empty when the result carries no location
    pub file: String,
    /// `startLine`, or 1 when absent
    pub line: u32,
    pub message: String,
}

/// Parse the first run of a SARIF document
pub fn parse_sarif(content: &str) -> DashboardResult<Vec<Finding>> {
    let log: SarifLog = serde_json::from_str(content)
        .map_err(|e| DashboardError::sarif(format!("invalid SARIF document: {e}")))?;
    let run = log
        .runs
        .into_iter()
        .next()
        .ok_or_else(|| DashboardError::sarif("report contains no runs"))?;

    let tool = run.tool.driver.name.to_lowercase();
    let findings = run
        .results
        .into_iter()
        .map(|result| {
            let (file, line) = match result.locations.into_iter().next() {
                Some(location) => {
                    let physical = location.physical_location;
                    let line = physical.region.and_then(|r| r.start_line).unwrap_or(1);
                    (physical.artifact_location.uri, line)
                }
                None => (String::new(), 1),
            };
            Finding {
                tool: tool.clone(),
                rule_id: result.rule_id,
                file,
                line,
                message: result.message.text,
            }
        })
        .collect();

    Ok(findings)
}

/// Read and parse a SARIF file
pub fn load_sarif<P: AsRef<Path>>(path: P) -> DashboardResult<Vec<Finding>> {
    let content = fs::read_to_string(&path).map_err(|e| {
        DashboardError::sarif(format!("Failed to read '{}': {}", path.as_ref().display(), e))
    })?;
    parse_sarif(&content)
}

/// Turn findings into violations of the ADRs that own their rules
pub fn map_findings(findings: &[Finding], manifest: &[ManifestEntry]) -> Vec<Violation> {
    let index = index_by_rule(manifest);
    findings
        .iter()
        .filter_map(|finding| {
            let rule_id = finding.rule_id.as_deref()?;
            match index.get(&(finding.tool.as_str(), rule_id)) {
                Some(adr_id) => Some(Violation::new(
                    *adr_id,
                    finding.file.clone(),
                    finding.line,
                    finding.message.clone(),
                )),
                None => {
                    tracing::debug!("No ADR enforces {}/{}", finding.tool, rule_id);
                    None
                }
            }
        })
        .collect()
}
