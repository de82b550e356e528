//! Rendering of dashboard views for the terminal
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - List, detail, violation and insight views are rendered from immutable snapshots
//! - Human output is plain text with optional color; JSON output is for scripting
//! - Markdown bodies are passed through untouched for an external renderer

use crate::domain::adr::AdrDocument;
use crate::domain::violations::{count_by_adr, DashboardError, DashboardResult, ManifestEntry, Violation};
use crate::insights::DashboardData;
use crate::state::{DashboardState, DetailView};
use serde_json::{json, Value as JsonValue};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Human,
    /// JSON for programmatic consumption
    Json,
}

impl OutputFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Options for customizing output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (human format only)
    pub use_colors: bool,
    /// Maximum number of violations listed under an ADR
    pub max_violations: Option<usize>,
    /// Width of insight bars in characters
    pub bar_width: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            max_violations: None,
            bar_width: 30,
        }
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Heading,
    Dim,
    Error,
    Warning,
    Ok,
    Accent,
}

/// Formats dashboard views in the requested output format
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Sidebar list: every enforced rule with its live violation count
    pub fn format_manifest(
        &self,
        manifest: &[ManifestEntry],
        violations: &[Violation],
        format: OutputFormat,
    ) -> DashboardResult<String> {
        let counts = count_by_adr(violations);
        match format {
            OutputFormat::Json => {
                let rules: Vec<JsonValue> = manifest
                    .iter()
                    .map(|r| {
                        json!({
                            "id": r.id,
                            "tool": r.tool,
                            "rule_id": r.rule_id,
                            "severity": r.severity,
                            "violations": counts.get(r.id.as_str()).copied().unwrap_or(0),
                        })
                    })
                    .collect();
                to_pretty(&json!({ "rules": rules }))
            }
            OutputFormat::Human => {
                let mut out = String::new();
                self.render_manifest(&mut out, manifest, &counts, None);
                Ok(out)
            }
        }
    }

    /// Detail view for one ADR plus the violations reported against it
    pub fn format_adr(
        &self,
        document: &AdrDocument,
        violations: &[&Violation],
        format: OutputFormat,
    ) -> DashboardResult<String> {
        match format {
            OutputFormat::Json => to_pretty(&json!({
                "frontmatter": document.frontmatter,
                "body": document.body,
                "violations": violations,
            })),
            OutputFormat::Human => {
                let mut out = String::new();
                self.render_document(&mut out, document);
                self.render_violations(&mut out, violations, false);
                Ok(out)
            }
        }
    }

    /// Flat violation listing
    pub fn format_violations(&self, violations: &[Violation], format: OutputFormat) -> DashboardResult<String> {
        match format {
            OutputFormat::Json => to_pretty(&json!({ "violations": violations })),
            OutputFormat::Human => {
                let refs: Vec<&Violation> = violations.iter().collect();
                let mut out = String::new();
                self.render_violations(&mut out, &refs, true);
                Ok(out)
            }
        }
    }

    /// Aggregate page with derived figures and text bars
    pub fn format_insights(&self, data: &DashboardData, format: OutputFormat) -> DashboardResult<String> {
        match format {
            OutputFormat::Json => to_pretty(&json!({ "data": data, "summary": data.summary() })),
            OutputFormat::Human => {
                let mut out = String::new();
                self.render_insights(&mut out, data);
                Ok(out)
            }
        }
    }

    /// Full live page: sidebar, detail pane and poll status
    pub fn format_dashboard(
        &self,
        state: &DashboardState,
        insights: &DashboardData,
        format: OutputFormat,
    ) -> DashboardResult<String> {
        match format {
            OutputFormat::Json => {
                let mut value = serde_json::to_value(state)
                    .map_err(|e| DashboardError::config(format!("JSON serialization failed: {e}")))?;
                value["filtered_violations"] = json!(state.filtered_violations());
                to_pretty(&value)
            }
            OutputFormat::Human => {
                let mut out = String::new();
                out.push_str(&format!("{}\n", self.paint("ADR Explorer", Tone::Heading)));
                out.push('\n');

                match state.detail_view() {
                    DetailView::Placeholder => {
                        out.push_str("Select an ADR to view its details.\n");
                    }
                    DetailView::Loading => {
                        out.push_str("Loading ADR…\n");
                    }
                    DetailView::Failed => {
                        out.push_str(&format!("{}\n", self.paint("Failed to load ADR details.", Tone::Error)));
                    }
                    DetailView::Insights => self.render_insights(&mut out, insights),
                    DetailView::Document(document) => {
                        self.render_document(&mut out, document);
                        self.render_violations(&mut out, &state.filtered_violations(), false);
                    }
                }

                out.push('\n');
                let counts = count_by_adr(state.violations());
                self.render_manifest(&mut out, state.manifest(), &counts, state.selection().adr_id());

                if state.violations_error() {
                    out.push_str(&format!(
                        "{}\n",
                        self.paint("⚠ Violation feed unavailable, showing last known results", Tone::Warning)
                    ));
                }
                if let Some(at) = state.violations_changed_at() {
                    out.push_str(&format!(
                        "{}\n",
                        self.paint(&format!("Violations last changed {}", at.format("%H:%M:%S UTC")), Tone::Dim)
                    ));
                }
                Ok(out)
            }
        }
    }

    fn render_manifest(
        &self,
        out: &mut String,
        manifest: &[ManifestEntry],
        counts: &std::collections::HashMap<&str, usize>,
        selected: Option<&str>,
    ) {
        out.push_str(&format!("{}\n", self.paint("All ADRs", Tone::Heading)));
        if manifest.is_empty() {
            out.push_str("  No ADRs available.\n");
            return;
        }
        for rule in manifest {
            let marker = if selected == Some(rule.id.as_str()) { "▶" } else { " " };
            let count = counts.get(rule.id.as_str()).copied().unwrap_or(0);
            let badge = if count > 0 {
                self.paint(&format!(" ({count})"), Tone::Error)
            } else {
                String::new()
            };
            out.push_str(&format!(
                " {} {}{}  {}\n",
                marker,
                self.paint(&rule.id, Tone::Accent),
                badge,
                self.paint(&rule.subtitle(), Tone::Dim)
            ));
        }
    }

    fn render_document(&self, out: &mut String, document: &AdrDocument) {
        out.push_str(&format!("{}\n", self.paint(&document.frontmatter.title, Tone::Heading)));
        let badges: Vec<String> = document
            .badges()
            .iter()
            .map(|b| self.paint(&format!("[{b}]"), Tone::Accent))
            .collect();
        out.push_str(&format!("{}\n", badges.join(" ")));
        out.push('\n');
        if !document.body.is_empty() {
            out.push_str(&format!("{}\n", document.body));
            out.push('\n');
        }
    }

    fn render_violations(&self, out: &mut String, violations: &[&Violation], with_adr: bool) {
        if violations.is_empty() {
            out.push_str(&format!("{}\n", self.paint("✅ No violations reported", Tone::Ok)));
            return;
        }

        out.push_str(&format!(
            "{}\n",
            self.paint(&format!("Violations ({})", violations.len()), Tone::Error)
        ));
        let shown = self.options.max_violations.unwrap_or(violations.len());
        for violation in violations.iter().take(shown) {
            if with_adr {
                out.push_str(&format!(
                    "  {} {}\n",
                    self.paint(&violation.adr_id, Tone::Accent),
                    violation.format_display()
                ));
            } else {
                out.push_str(&format!("  {}\n", violation.format_display()));
            }
        }
        if violations.len() > shown {
            out.push_str(&format!(
                "{}\n",
                self.paint(&format!("  … {} more", violations.len() - shown), Tone::Dim)
            ));
        }
    }

    fn render_insights(&self, out: &mut String, data: &DashboardData) {
        let summary = data.summary();
        out.push_str(&format!("{}\n", self.paint("Dashboard", Tone::Heading)));
        out.push_str(&format!(
            "Compliance: {}% ADRs enforced ({} of {})\n",
            summary.compliance_percent, summary.enforced_adrs, summary.total_adrs
        ));
        out.push('\n');

        out.push_str(&format!("{}\n", self.paint("Team-level violations", Tone::Heading)));
        let max = data.services.iter().map(|s| s.total()).max().unwrap_or(0);
        for service in &data.services {
            out.push_str(&format!(
                "  {:<18} {} {} (E{} W{} I{})\n",
                service.name,
                self.bar(service.total(), max),
                service.total(),
                service.errors,
                service.warnings,
                service.infos
            ));
        }
        out.push('\n');

        out.push_str(&format!("{}\n", self.paint("Burn-down (open / closed)", Tone::Heading)));
        let max = data.burn_down.iter().map(|p| p.open.max(p.closed)).max().unwrap_or(0);
        for point in &data.burn_down {
            out.push_str(&format!("  {}  {} {:>3} open\n", point.week, self.bar(point.open, max), point.open));
            out.push_str(&format!("  {:10}  {} {:>3} closed\n", "", self.bar(point.closed, max), point.closed));
        }
        out.push_str(&format!("  net change in open violations: {:+}\n", summary.burn_down_net_change));
        out.push('\n');

        out.push_str(&format!("{}\n", self.paint("High-severity trend", Tone::Heading)));
        let max = data
            .high_severity_trend
            .iter()
            .map(|p| p.high_severity_count)
            .max()
            .unwrap_or(0);
        for point in &data.high_severity_trend {
            out.push_str(&format!(
                "  Week of {}  {} {}\n",
                point.week,
                self.bar(point.high_severity_count, max),
                point.high_severity_count
            ));
        }
        out.push('\n');

        out.push_str(&format!("{}\n", self.paint("Adoption & growth", Tone::Heading)));
        let max = data
            .quarterly_adrs
            .iter()
            .map(|q| q.created.max(q.updated))
            .max()
            .unwrap_or(0);
        for quarter in &data.quarterly_adrs {
            out.push_str(&format!(
                "  {}  created {} {}  updated {} {}\n",
                quarter.quarter,
                self.bar(quarter.created, max),
                quarter.created,
                self.bar(quarter.updated, max),
                quarter.updated
            ));
        }

        if !data.coverage.unenforced_list.is_empty() {
            out.push('\n');
            out.push_str(&format!(
                "{}\n",
                self.paint(&format!("Unenforced ADRs ({})", summary.unenforced_count), Tone::Heading)
            ));
            for adr in &data.coverage.unenforced_list {
                out.push_str(&format!("  • {adr}\n"));
            }
        }
    }

    fn bar(&self, value: impl Into<u64>, max: impl Into<u64>) -> String {
        let (value, max) = (value.into(), max.into());
        if max == 0 {
            return String::new();
        }
        let full = self.options.bar_width as u128;
        let width = (u128::from(value) * full).div_ceil(u128::from(max)).min(full);
        "█".repeat(width as usize)
    }

    #[cfg(feature = "colored")]
    fn paint(&self, text: &str, tone: Tone) -> String {
        use colored::Colorize;

        if !self.options.use_colors {
            return text.to_string();
        }
        match tone {
            Tone::Heading => text.bold().to_string(),
            Tone::Dim => text.dimmed().to_string(),
            Tone::Error => text.red().to_string(),
            Tone::Warning => text.yellow().to_string(),
            Tone::Ok => text.green().to_string(),
            Tone::Accent => text.cyan().to_string(),
        }
    }

    #[cfg(not(feature = "colored"))]
    fn paint(&self, text: &str, _tone: Tone) -> String {
        text.to_string()
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new(ReportOptions::default())
    }
}

fn to_pretty(value: &JsonValue) -> DashboardResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DashboardError::config(format!("JSON serialization failed: {e}")))
}
