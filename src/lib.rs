//! Deterministic rule engine for structured tax document audits.
//!
//! Declarative per-form, per-tax-year rules are loaded into an
//! immutable catalog, indexed by a registry, and evaluated against
//! caller documents through the [`engine::RuleEngine`] facade. Per-rule
//! evaluation faults are fail-closed: a broken rule is treated as
//! non-matching and never aborts an audit run.

pub mod cli;
pub mod engine;
pub mod error;
pub mod loader;
pub mod output;
pub mod registry;
pub mod report;
pub mod rules;

pub use engine::{Finding, RuleEngine};
pub use error::{ConfigError, EngineError};
pub use loader::RuleCatalog;
pub use registry::RuleRegistry;
