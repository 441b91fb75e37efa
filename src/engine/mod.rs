//! Deterministic rule-evaluation engine.
//!
//! `evaluate()` is a single stateless pass: resolve form and year,
//! build the environment, iterate year-filtered candidate rules,
//! evaluate each condition fail-closed, and collect findings in rule
//! discovery order.

pub mod document;
pub mod env;
pub mod expr;
mod issue;
mod template;

pub use env::Environment;
pub use issue::{build_finding, Finding};

use serde_json::Value;

use crate::error::EngineError;
use crate::registry::RuleRegistry;

/// Evaluates declarative rules against structured tax documents.
pub struct RuleEngine {
    registry: RuleRegistry,
}

impl RuleEngine {
    /// Create an engine over an immutable registry.
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Audit one document and return findings in rule discovery order.
    ///
    /// `form_type` and `tax_year` override document-embedded values when
    /// supplied. Fails when the document is not an object or no form
    /// type can be resolved; per-rule faults never propagate.
    pub fn evaluate(
        &self,
        document: &Value,
        form_type: Option<&str>,
        tax_year: Option<i32>,
    ) -> Result<Vec<Finding>, EngineError> {
        if !document.is_object() {
            return Err(EngineError::DocumentNotObject);
        }

        let resolved_form = resolve_form_type(document, form_type)?;
        let resolved_year = tax_year.or_else(|| embedded_tax_year(document));

        let year_params = self.registry.year_params(resolved_year);
        let env = Environment::build(document, &resolved_form, resolved_year, year_params);

        let mut findings = Vec::new();
        for rule in self.registry.rules_for(&resolved_form) {
            if !rule.matches_year(resolved_year) {
                continue;
            }
            let condition = rule.condition.expr.trim();
            if condition.is_empty() {
                continue;
            }
            if expr::evaluate_condition(condition, &env) {
                findings.push(build_finding(rule, &env, &resolved_form, resolved_year));
            }
        }

        tracing::debug!(
            form_type = %resolved_form,
            tax_year = ?resolved_year,
            findings = findings.len(),
            "evaluated document"
        );
        Ok(findings)
    }
}

/// Form type from the argument or the document's `doc_type`/`form_type`
/// keys, uppercased.
fn resolve_form_type(
    document: &Value,
    form_type: Option<&str>,
) -> Result<String, EngineError> {
    form_type
        .map(str::to_string)
        .or_else(|| {
            document
                .get("doc_type")
                .or_else(|| document.get("form_type"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .map(|form| form.trim().to_uppercase())
        .filter(|form| !form.is_empty())
        .ok_or(EngineError::MissingFormType)
}

/// Tax year from the document, accepting numbers or numeric strings.
fn embedded_tax_year(document: &Value) -> Option<i32> {
    match document.get("tax_year")? {
        Value::Number(n) => n.as_i64().map(|y| y as i32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::RuleCatalog;
    use crate::rules::RuleDefinition;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn rule(id: &str, expr: &str) -> RuleDefinition {
        serde_json::from_value(json!({
            "id": id,
            "form_types": ["W2"],
            "condition": {"expr": expr},
        }))
        .unwrap()
    }

    fn engine_with(rules: Vec<RuleDefinition>) -> RuleEngine {
        let mut year_parameters = BTreeMap::new();
        year_parameters.insert(
            2024,
            json!({
                "limits": {"social_security_wage_base": 168600},
                "rates": {"social_security_rate": 0.062, "medicare_rate": 0.0145},
            })
            .as_object()
            .unwrap()
            .clone(),
        );
        RuleEngine::new(RuleRegistry::new(RuleCatalog {
            rules,
            year_parameters,
        }))
    }

    fn w2_document() -> Value {
        json!({
            "doc_type": "W2",
            "tax_year": 2024,
            "amounts": {"wages": 85000, "federal_withholding": 0},
        })
    }

    #[test]
    fn test_rule_fires_iff_condition_true() {
        let engine = engine_with(vec![
            rule("FIRES", "wages > 0 and federal_withholding == 0"),
            rule("QUIET", "federal_withholding > 0"),
        ]);
        let findings = engine.evaluate(&w2_document(), None, None).unwrap();
        let codes: Vec<&str> = findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec!["FIRES"]);
    }

    #[test]
    fn test_year_filter_skips_before_condition() {
        let mut restricted = rule("OLD_YEARS_ONLY", "wages > 0");
        restricted.tax_years = Some(vec![json!(2020), json!(2021)]);
        let engine = engine_with(vec![restricted]);
        let findings = engine.evaluate(&w2_document(), None, None).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_year_filter_allows_member_year() {
        let mut restricted = rule("CURRENT", "wages > 0");
        restricted.tax_years = Some(vec![json!(2024)]);
        let engine = engine_with(vec![restricted]);
        let findings = engine.evaluate(&w2_document(), None, None).unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_idempotent_ordered_output() {
        let engine = engine_with(vec![
            rule("A", "wages > 0"),
            rule("B", "federal_withholding == 0"),
            rule("C", "wages > 1000"),
        ]);
        let doc = w2_document();
        let first: Vec<String> = engine
            .evaluate(&doc, None, None)
            .unwrap()
            .into_iter()
            .map(|f| f.code)
            .collect();
        let second: Vec<String> = engine
            .evaluate(&doc, None, None)
            .unwrap()
            .into_iter()
            .map(|f| f.code)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_broken_rule_does_not_abort_siblings() {
        let engine = engine_with(vec![
            rule("BEFORE", "wages > 0"),
            rule("BROKEN", "undefined_name > 0"),
            rule("AFTER", "federal_withholding == 0"),
        ]);
        let findings = engine.evaluate(&w2_document(), None, None).unwrap();
        let codes: Vec<&str> = findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec!["BEFORE", "AFTER"]);
    }

    #[test]
    fn test_missing_form_type_rejected() {
        let engine = engine_with(vec![rule("ANY", "true")]);
        let result = engine.evaluate(&json!({"tax_year": 2024}), None, None);
        assert!(matches!(result, Err(EngineError::MissingFormType)));
    }

    #[test]
    fn test_non_object_document_rejected() {
        let engine = engine_with(vec![]);
        let result = engine.evaluate(&json!([1, 2, 3]), None, None);
        assert!(matches!(result, Err(EngineError::DocumentNotObject)));
    }

    #[test]
    fn test_form_type_argument_overrides_document() {
        let engine = engine_with(vec![rule("W2_ONLY", "true")]);
        let doc = json!({"doc_type": "1099-NEC"});
        assert!(engine.evaluate(&doc, None, None).unwrap().is_empty());
        assert_eq!(engine.evaluate(&doc, Some("w2"), None).unwrap().len(), 1);
    }

    #[test]
    fn test_form_type_resolution_is_case_insensitive() {
        let engine = engine_with(vec![rule("ANY", "true")]);
        let doc = json!({"doc_type": "w2"});
        assert_eq!(engine.evaluate(&doc, None, None).unwrap().len(), 1);
    }

    #[test]
    fn test_tax_year_from_numeric_string() {
        let mut restricted = rule("CURRENT", "true");
        restricted.tax_years = Some(vec![json!(2024)]);
        let engine = engine_with(vec![restricted]);
        let doc = json!({"doc_type": "W2", "tax_year": "2024"});
        assert_eq!(engine.evaluate(&doc, None, None).unwrap().len(), 1);
    }

    #[test]
    fn test_unsupported_year_degrades_silently() {
        // Rules that depend on year parameters stop firing, everything
        // else still evaluates; no error escapes.
        let engine = engine_with(vec![
            rule("NEEDS_PARAMS", "wages > year_params.limits.social_security_wage_base"),
            rule("PLAIN", "wages > 0"),
        ]);
        let mut doc = w2_document();
        doc["tax_year"] = json!(1999);
        doc["amounts"]["wages"] = json!(200000);
        let findings = engine.evaluate(&doc, None, None).unwrap();
        let codes: Vec<&str> = findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec!["PLAIN"]);

        doc["tax_year"] = json!(2024);
        let findings = engine.evaluate(&doc, None, None).unwrap();
        let codes: Vec<&str> = findings.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec!["NEEDS_PARAMS", "PLAIN"]);
    }

    #[test]
    fn test_empty_condition_never_fires() {
        let engine = engine_with(vec![rule("BLANK", "  ")]);
        let findings = engine.evaluate(&w2_document(), None, None).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_document_never_mutated() {
        let engine = engine_with(vec![rule("A", "wages > 0")]);
        let doc = w2_document();
        let before = doc.clone();
        engine.evaluate(&doc, None, None).unwrap();
        assert_eq!(doc, before);
    }
}
