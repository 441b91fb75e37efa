use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration problems surfaced while loading rule or
/// year-parameter sources, or through the strict year-context API.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rules directory not found: {0}")]
    RulesDirNotFound(PathBuf),

    #[error("year parameter directory not found: {0}")]
    ParamsDirNotFound(PathBuf),

    #[error("invalid year parameter filename: {0}")]
    InvalidYearFilename(String),

    #[error("year parameter file must be a mapping: {0}")]
    ParamsNotAMapping(String),

    #[error("config for tax year {year} missing required keys: {missing}")]
    MissingRequiredKeys { year: i32, missing: String },

    #[error("no year parameter files found in {0}")]
    NoYearsFound(PathBuf),

    #[error("unsupported tax year: {0}")]
    UnsupportedYear(i32),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Rejected evaluation requests. Per-rule faults are never surfaced
/// here; they are swallowed at the rule boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("document must be a JSON object")]
    DocumentNotObject,

    #[error("document missing doc_type/form_type")]
    MissingFormType,
}
