mod definition;
pub mod w2_extended;

pub use definition::{Condition, Reference, RuleDefinition, Severity};
