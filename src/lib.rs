//! ADR Dashboard - Architecture Decision Records, their enforcement manifest and live violations
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure domain records and parsing separated from HTTP and timers
//! - Loaders own the failure policy for each endpoint
//! - The live `Dashboard` runtime drives an explicit state container

pub mod api;
pub mod config;
pub mod domain;
pub mod insights;
pub mod loader;
pub mod poller;
pub mod report;
pub mod sarif;
pub mod state;

// Re-export main types for convenient access
pub use domain::adr::{parse_adr, AdrDocument, AdrFrontmatter, Enforcement};
pub use domain::violations::{
    filter_violations, DashboardError, DashboardResult, ManifestEntry, Violation,
};

pub use api::{DashboardApi, HttpApi};

pub use config::{ConfigBuilder, DashboardConfig};

pub use insights::DashboardData;

pub use loader::{load_adr, load_manifest, poll_violations};

pub use poller::Dashboard;

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use state::{DashboardState, DetailView, Selection, DASHBOARD_SENTINEL};

use std::path::Path;
use std::sync::Arc;

/// Outcome of a SARIF upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    /// Results read from the report
    pub findings: usize,
    /// Violations mapped onto ADRs (and sent, unless dry-run)
    pub violations: Vec<Violation>,
    /// Whether the violations were posted
    pub uploaded: bool,
}

/// Build an HTTP client from configuration
pub fn connect(config: &DashboardConfig) -> DashboardResult<Arc<dyn DashboardApi>> {
    Ok(Arc::new(HttpApi::from_config(config)?))
}

/// Start a live dashboard with the configured intervals
pub fn start_dashboard(api: Arc<dyn DashboardApi>, config: &DashboardConfig) -> Dashboard {
    Dashboard::start(api, config.api.repo_key.clone(), &config.polling)
}

/// Map a SARIF report through the manifest and upload the resulting violations.
///
/// The manifest is required here, so a manifest failure is an error rather
/// than an empty mapping. Nothing is posted when no finding maps to an ADR.
pub async fn upload_sarif<P: AsRef<Path>>(
    api: &dyn DashboardApi,
    repo_key: &str,
    sarif_path: P,
    dry_run: bool,
) -> DashboardResult<UploadOutcome> {
    let manifest = api.fetch_manifest(repo_key).await?;
    let findings = sarif::load_sarif(sarif_path)?;
    let violations = sarif::map_findings(&findings, &manifest);

    let uploaded = !dry_run && !violations.is_empty();
    if uploaded {
        api.upload_violations(&violations).await?;
        tracing::info!("Uploaded {} violations", violations.len());
    }

    Ok(UploadOutcome {
        findings: findings.len(),
        violations,
        uploaded,
    })
}
