//! Canonical `Finding` record and the builder that produces it from a
//! matched rule.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rules::{Reference, RuleDefinition, Severity};

use super::env::Environment;
use super::template;

/// One triggered rule instance.
///
/// The schema is stable: every field a rule author may omit has a
/// deterministic default, so downstream consumers never special-case
/// missing keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    /// Unique id for this emission.
    pub id: String,
    /// Rule id that fired.
    pub code: String,
    pub name: String,
    pub form_type: String,
    pub severity: Severity,
    pub rule_type: String,
    pub category: String,
    pub summary: String,
    pub message: String,
    pub fields: Vec<String>,
    pub field_paths: Vec<String>,
    pub citations: Vec<Reference>,
    pub tags: Vec<String>,
    pub tax_year: Option<i32>,
    pub rule_source: Option<String>,
    /// Condition expression, kept for traceability.
    pub condition: String,
    pub hint: Option<String>,
    pub extras: Map<String, Value>,
}

/// Build the canonical finding for a matched rule.
pub fn build_finding(
    rule: &RuleDefinition,
    env: &Environment,
    form_type: &str,
    tax_year: Option<i32>,
) -> Finding {
    // A rule authored with only a name uses it as the message too.
    let message_source = if rule.description.is_empty() {
        &rule.name
    } else {
        &rule.description
    };
    let message = template::render(message_source, env);
    let summary = rule
        .summary
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| non_empty(&rule.name))
        .or_else(|| non_empty(&rule.description))
        .unwrap_or_else(|| rule.id.clone());

    Finding {
        id: uuid::Uuid::new_v4().to_string(),
        code: rule.id.clone(),
        name: rule.name.clone(),
        form_type: form_type.to_string(),
        severity: rule.severity,
        rule_type: rule
            .rule_type
            .clone()
            .unwrap_or_else(|| "structural".to_string()),
        category: rule.category.clone().unwrap_or_else(|| "other".to_string()),
        summary,
        message,
        fields: rule.fields.clone(),
        field_paths: rule.field_paths.clone(),
        citations: rule.references.clone(),
        tags: rule.tags.clone(),
        tax_year,
        rule_source: rule.source.clone(),
        condition: rule.condition.expr.clone(),
        hint: rule.hint.clone(),
        extras: rule.extras.clone().unwrap_or_default(),
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
