//! Aggregate insights shown on the dashboard page
//!
//! Architecture: Read Model - static series consumed by chart renderers
//! - The built-in dataset is a fixed snapshot, not computed from live data
//! - Derived figures (compliance, totals, trends) are pure functions of the dataset
//! - A custom dataset can be loaded from YAML or JSON with the same shape

use crate::domain::violations::{DashboardError, DashboardResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Violation counts for one service, stacked by severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceViolations {
    pub name: String,
    pub errors: u32,
    pub warnings: u32,
    pub infos: u32,
}

impl ServiceViolations {
    pub fn total(&self) -> u64 {
        u64::from(self.errors) + u64::from(self.warnings) + u64::from(self.infos)
    }
}

/// Open vs closed violations for one week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnDownPoint {
    pub week: String,
    pub open: u32,
    pub closed: u32,
}

/// How many ADRs carry an automated rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub total_adrs: u32,
    pub enforced_adrs: u32,
    pub unenforced_list: Vec<String>,
}

impl Coverage {
    /// Enforced share in whole percent; zero when there are no ADRs
    pub fn compliance_percent(&self) -> u32 {
        if self.total_adrs == 0 {
            return 0;
        }
        ((f64::from(self.enforced_adrs) / f64::from(self.total_adrs)) * 100.0).round() as u32
    }

    pub fn unenforced_count(&self) -> u32 {
        self.total_adrs.saturating_sub(self.enforced_adrs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityTrendPoint {
    pub week: String,
    pub high_severity_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyAdrs {
    pub quarter: String,
    pub created: u32,
    pub updated: u32,
}

/// Everything the aggregate page plots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub services: Vec<ServiceViolations>,
    pub burn_down: Vec<BurnDownPoint>,
    pub coverage: Coverage,
    pub high_severity_trend: Vec<SeverityTrendPoint>,
    pub quarterly_adrs: Vec<QuarterlyAdrs>,
}

/// Derived figures printed next to the charts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightSummary {
    pub compliance_percent: u32,
    pub enforced_adrs: u32,
    pub total_adrs: u32,
    pub unenforced_count: u32,
    pub total_service_violations: u64,
    /// Change in open violations from the first to the last burn-down week
    pub burn_down_net_change: i64,
    /// Change in high-severity count across the trend
    pub high_severity_change: i64,
}

impl DashboardData {
    /// The snapshot bundled with the dashboard
    pub fn builtin() -> Self {
        let service = |name: &str, errors, warnings, infos| ServiceViolations {
            name: name.to_string(),
            errors,
            warnings,
            infos,
        };
        let week = |week: &str, open, closed| BurnDownPoint {
            week: week.to_string(),
            open,
            closed,
        };
        let trend = |week: &str, high_severity_count| SeverityTrendPoint {
            week: week.to_string(),
            high_severity_count,
        };
        let quarter = |quarter: &str, created, updated| QuarterlyAdrs {
            quarter: quarter.to_string(),
            created,
            updated,
        };

        Self {
            services: vec![
                service("auth-service", 15, 5, 2),
                service("payment-service", 10, 8, 4),
                service("ui-frontend", 5, 12, 6),
                service("data-pipeline", 8, 3, 1),
            ],
            burn_down: vec![
                week("2025-02-10", 42, 8),
                week("2025-02-17", 40, 10),
                week("2025-02-24", 38, 15),
                week("2025-03-03", 35, 12),
                week("2025-03-10", 33, 14),
                week("2025-03-17", 30, 18),
                week("2025-03-24", 28, 20),
                week("2025-03-31", 25, 22),
            ],
            coverage: Coverage {
                total_adrs: 20,
                enforced_adrs: 12,
                unenforced_list: [
                    "ADR-SEC-005",
                    "ADR-PERF-003",
                    "ADR-DB-002",
                    "ADR-UI-004",
                    "ADR-OPS-006",
                    "ADR-INT-001",
                    "ADR-LOG-007",
                    "ADR-DATA-008",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            },
            high_severity_trend: vec![
                trend("2025-01-01", 20),
                trend("2025-01-08", 18),
                trend("2025-01-15", 16),
                trend("2025-01-22", 14),
                trend("2025-01-29", 12),
                trend("2025-02-05", 11),
                trend("2025-02-12", 10),
                trend("2025-02-19", 9),
                trend("2025-02-26", 8),
                trend("2025-03-05", 7),
                trend("2025-03-12", 6),
                trend("2025-03-19", 5),
            ],
            quarterly_adrs: vec![
                quarter("Q2 2024", 4, 2),
                quarter("Q3 2024", 6, 3),
                quarter("Q4 2024", 3, 5),
                quarter("Q1 2025", 7, 4),
            ],
        }
    }

    /// Load a dataset from a YAML (or JSON) file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> DashboardResult<Self> {
        let contents = fs::read_to_string(&path)?;
        serde_yaml::from_str(&contents).map_err(|e| {
            DashboardError::config(format!(
                "Failed to parse insights data '{}': {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    pub fn summary(&self) -> InsightSummary {
        InsightSummary {
            compliance_percent: self.coverage.compliance_percent(),
            enforced_adrs: self.coverage.enforced_adrs,
            total_adrs: self.coverage.total_adrs,
            unenforced_count: self.coverage.unenforced_count(),
            total_service_violations: self
                .services
                .iter()
                .map(ServiceViolations::total)
                .fold(0, u64::saturating_add),
            burn_down_net_change: net_change(self.burn_down.iter().map(|p| p.open)),
            high_severity_change: net_change(
                self.high_severity_trend.iter().map(|p| p.high_severity_count),
            ),
        }
    }
}

impl Default for DashboardData {
    fn default() -> Self {
        Self::builtin()
    }
}

fn net_change(mut series: impl Iterator<Item = u32>) -> i64 {
    let Some(first) = series.next() else {
        return 0;
    };
    let last = series.last().unwrap_or(first);
    i64::from(last) - i64::from(first)
}
