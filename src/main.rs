use anyhow::{Context, Result};
use clap::Parser;
use taxaudit::cli::Cli;
use taxaudit::engine::RuleEngine;
use taxaudit::loader::RuleCatalog;
use taxaudit::output::summary::print_summary;
use taxaudit::registry::RuleRegistry;
use taxaudit::report::AuditReport;
use taxaudit::rules::w2_extended;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.document)
        .with_context(|| format!("Failed to read document {:?}", cli.document))?;
    let document: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse document {:?}", cli.document))?;

    let catalog = RuleCatalog::load(&cli.rules_dir, &cli.params_dir)?;
    let registry = RuleRegistry::with_extensions(catalog, w2_extended::rules());
    let engine = RuleEngine::new(registry);

    let findings = engine.evaluate(&document, cli.form_type.as_deref(), cli.tax_year)?;

    let form_type = findings
        .first()
        .map(|finding| finding.form_type.clone())
        .or(cli.form_type)
        .or_else(|| {
            document
                .get("doc_type")
                .or_else(|| document.get("form_type"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_uppercase)
        })
        .unwrap_or_default();
    let tax_year = findings
        .first()
        .and_then(|finding| finding.tax_year)
        .or(cli.tax_year)
        .or_else(|| document.get("tax_year").and_then(serde_json::Value::as_i64).map(|y| y as i32));

    let report = AuditReport::new(&form_type, tax_year, findings);

    match cli.output {
        Some(path) => {
            report.write_json(&path)?;
            print_summary(&report, &path.display().to_string());
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
