use crate::report::{AuditReport, ReportStatus};
use crate::rules::Severity;

/// Print human-readable summary to stdout
pub fn print_summary(report: &AuditReport, output_path: &str) {
    println!();
    println!("TaxAudit Report Summary");
    println!("-----------------------");
    println!();

    println!("Form: {}", report.form_type);
    match report.tax_year {
        Some(year) => println!("Tax year: {}", year),
        None => println!("Tax year: (unresolved)"),
    }
    println!("Generated: {}", report.generated_at);
    println!();

    let status_text = match report.summary.status {
        ReportStatus::Healthy => "HEALTHY",
        ReportStatus::Warning => "WARNING",
        ReportStatus::Critical => "CRITICAL",
    };
    println!("Status: {}", status_text);
    println!();

    if !report.findings.is_empty() {
        println!(
            "Findings ({} total, {} critical, {} warning, {} info):",
            report.summary.findings_count,
            report.summary.critical_count,
            report.summary.warning_count,
            report.summary.info_count
        );

        for finding in &report.findings {
            let tag = match finding.severity {
                Severity::Critical => "CRIT",
                Severity::Warning => "WARN",
                Severity::Info => "INFO",
            };
            println!("  [{}] {}: {}", tag, finding.code, finding.message);
        }
        println!();
    }

    println!("Full report written to: {}", output_path);
    println!();
}

/// Format summary as string (for testing)
pub fn format_summary(report: &AuditReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Status: {:?}\n", report.summary.status));
    output.push_str(&format!("Findings: {}\n", report.summary.findings_count));

    for finding in &report.findings {
        output.push_str(&format!(
            "[{:?}] {}: {}\n",
            finding.severity, finding.code, finding.message
        ));
    }

    output
}
