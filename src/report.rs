//! Audit report wrapper serialized by the CLI.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::engine::Finding;
use crate::rules::Severity;

/// Overall report status derived from finding severities
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Healthy,
    Warning,
    Critical,
}

/// Report summary with counts per severity
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub status: ReportStatus,
    pub findings_count: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

/// One audited document's findings plus metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditReport {
    pub report_version: String,
    pub report_id: String,
    pub generated_at: String,
    pub form_type: String,
    pub tax_year: Option<i32>,
    pub summary: Summary,
    pub findings: Vec<Finding>,
}

impl AuditReport {
    /// Build a report around a finished evaluation.
    pub fn new(form_type: &str, tax_year: Option<i32>, findings: Vec<Finding>) -> Self {
        let critical_count = count(&findings, Severity::Critical);
        let warning_count = count(&findings, Severity::Warning);
        let info_count = count(&findings, Severity::Info);
        let status = if critical_count > 0 {
            ReportStatus::Critical
        } else if warning_count > 0 {
            ReportStatus::Warning
        } else {
            ReportStatus::Healthy
        };

        Self {
            report_version: "1.0.0".to_string(),
            report_id: uuid::Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            form_type: form_type.to_string(),
            tax_year,
            summary: Summary {
                status,
                findings_count: findings.len(),
                critical_count,
                warning_count,
                info_count,
            },
            findings,
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize report to JSON")?;
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        Ok(())
    }
}

fn count(findings: &[Finding], severity: Severity) -> usize {
    findings.iter().filter(|f| f.severity == severity).count()
}
