use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "taxaudit")]
#[command(about = "Deterministic rule engine for structured tax documents")]
#[command(version)]
pub struct Cli {
    /// Document JSON file to audit
    #[arg(long)]
    pub document: PathBuf,

    /// Directory of declarative rule files
    #[arg(long, default_value = "rules", env = "TAXAUDIT_RULES_DIR")]
    pub rules_dir: PathBuf,

    /// Directory of per-year parameter files
    #[arg(long, default_value = "year_params", env = "TAXAUDIT_PARAMS_DIR")]
    pub params_dir: PathBuf,

    /// Override the document's form type
    #[arg(long)]
    pub form_type: Option<String>,

    /// Override the document's tax year
    #[arg(long)]
    pub tax_year: Option<i32>,

    /// Write the report here instead of printing it
    #[arg(long)]
    pub output: Option<PathBuf>,
}
