//! End-to-end runs over the shipped rule catalogue and year parameters.

use std::path::PathBuf;

use serde_json::{json, Value};
use taxaudit::engine::RuleEngine;
use taxaudit::error::ConfigError;
use taxaudit::loader::RuleCatalog;
use taxaudit::registry::RuleRegistry;
use taxaudit::rules::w2_extended;

fn shipped_engine() -> RuleEngine {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let catalog = RuleCatalog::load(&root.join("rules"), &root.join("year_params"))
        .expect("shipped catalogue loads");
    RuleEngine::new(RuleRegistry::with_extensions(catalog, w2_extended::rules()))
}

fn codes(engine: &RuleEngine, doc: &Value) -> Vec<String> {
    engine
        .evaluate(doc, None, None)
        .expect("evaluation succeeds")
        .into_iter()
        .map(|finding| finding.code)
        .collect()
}

fn clean_w2() -> Value {
    json!({
        "doc_type": "W2",
        "tax_year": 2024,
        "taxpayer": {"ssn": "123-45-6789"},
        "employer": {"ein": "12-3456789", "state": "CA"},
        "amounts": {
            "wages": 85000.0,
            "federal_withholding": 9000.0,
            "social_security_wages": 85000.0,
            "social_security_tax": 5270.0,
            "medicare_wages": 85000.0,
            "medicare_tax": 1232.5,
            "state_withholding": 0.0,
        },
    })
}

#[test]
fn clean_w2_produces_no_findings() {
    let engine = shipped_engine();
    let fired = codes(&engine, &clean_w2());
    assert!(fired.is_empty(), "unexpected findings: {fired:?}");
}

#[test]
fn bad_w2_fires_identity_and_withholding_rules() {
    let engine = shipped_engine();
    let doc = json!({
        "doc_type": "W2",
        "tax_year": 2024,
        "taxpayer": {"ssn": "123"},
        "employer": {"ein": "12-3456789"},
        "amounts": {"wages": 85000.0, "federal_withholding": 0.0},
    });
    let fired = codes(&engine, &doc);
    assert!(fired.contains(&"W2_SSN_FORMAT".to_string()), "fired: {fired:?}");
    assert!(fired.contains(&"W2_ZERO_FED_WITHHOLDING".to_string()), "fired: {fired:?}");
    assert!(fired.contains(&"W2_SSN_MASKED_FORMAT".to_string()), "fired: {fired:?}");
}

#[test]
fn ss_tax_tolerance_fires_on_mismatch() {
    let engine = shipped_engine();
    let mut doc = clean_w2();
    doc["amounts"]["social_security_tax"] = json!(4000.0);
    let fired = codes(&engine, &doc);
    assert_eq!(fired, vec!["W2_SS_TAX_TOLERANCE"]);
}

#[test]
fn wage_base_rule_uses_year_parameters() {
    let engine = shipped_engine();
    let mut doc = clean_w2();
    doc["amounts"]["social_security_wages"] = json!(170000.0);
    doc["amounts"]["wages"] = json!(170000.0);
    doc["amounts"]["social_security_tax"] = json!(170000.0 * 0.062);
    doc["amounts"]["medicare_wages"] = json!(170000.0);
    doc["amounts"]["medicare_tax"] = json!(170000.0 * 0.0145);

    // Above the 2024 base of 168600, below the 2025 base of 176100.
    let fired = codes(&engine, &doc);
    assert!(fired.contains(&"W2_SS_WAGE_BASE_EXCEEDED".to_string()), "fired: {fired:?}");

    doc["tax_year"] = json!(2025);
    let fired = codes(&engine, &doc);
    assert!(!fired.contains(&"W2_SS_WAGE_BASE_EXCEEDED".to_string()), "fired: {fired:?}");
}

#[test]
fn legacy_document_shape_fires_same_rules() {
    let engine = shipped_engine();
    let legacy = json!({
        "doc_type": "W2",
        "tax_year": 2024,
        "taxpayer": {"ssn": "123-45-6789"},
        "employer": {"ein": "12-3456789", "state": "CA"},
        "wages": {
            "wages_tips_other": 85000.0,
            "federal_income_tax_withheld": 0.0,
            "social_security_wages": 85000.0,
            "social_security_tax_withheld": 5270.0,
            "medicare_wages": 85000.0,
            "medicare_tax_withheld": 1232.5,
        },
    });
    let mut canonical = clean_w2();
    canonical["amounts"]["federal_withholding"] = json!(0.0);

    assert_eq!(codes(&engine, &legacy), codes(&engine, &canonical));
    assert_eq!(codes(&engine, &legacy), vec!["W2_ZERO_FED_WITHHOLDING"]);
}

#[test]
fn bad_1099_fires_tin_rules() {
    let engine = shipped_engine();
    let doc = json!({
        "doc_type": "1099-NEC",
        "tax_year": 2024,
        "payer_info": {"tin": "1"},
        "amounts": {"nonemployee_compensation": 12000.0},
    });
    let fired = codes(&engine, &doc);
    assert!(fired.contains(&"F1099_PAYER_TIN_FORMAT".to_string()), "fired: {fired:?}");
    assert!(fired.contains(&"F1099_MISSING_RECIPIENT_TIN".to_string()), "fired: {fired:?}");
}

#[test]
fn clean_1099_is_quiet() {
    let engine = shipped_engine();
    let doc = json!({
        "doc_type": "1099-NEC",
        "tax_year": 2024,
        "payer": {"tin": "12-3456789"},
        "recipient": {"tin": "123-45-6789"},
        "amounts": {"nonemployee_compensation": 12000.0, "federal_withholding": 1200.0},
    });
    let fired = codes(&engine, &doc);
    assert!(fired.is_empty(), "unexpected findings: {fired:?}");
}

#[test]
fn f1040_reconciliation_rule() {
    let engine = shipped_engine();
    let doc = json!({
        "doc_type": "1040",
        "tax_year": 2024,
        "amounts": {"wages": 90000.0, "total_income": 85000.0},
    });
    let fired = codes(&engine, &doc);
    assert_eq!(fired, vec!["F1040_WAGES_EXCEED_TOTAL_INCOME"]);
}

#[test]
fn output_is_idempotent_and_ordered() {
    let engine = shipped_engine();
    let doc = json!({
        "doc_type": "W2",
        "tax_year": 2024,
        "taxpayer": {"ssn": "123"},
        "amounts": {"wages": 85000.0, "federal_withholding": 0.0},
    });
    let first = codes(&engine, &doc);
    let second = codes(&engine, &doc);
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn shipped_years_load_and_strict_lookup_rejects_others() {
    let engine = shipped_engine();
    let registry = engine.registry();
    assert_eq!(registry.supported_years(), vec![2023, 2024, 2025]);
    assert!(matches!(
        registry.context_for_year(1999),
        Err(ConfigError::UnsupportedYear(1999))
    ));
}

#[test]
fn unknown_form_type_yields_empty_report() {
    let engine = shipped_engine();
    let doc = json!({"doc_type": "K1", "tax_year": 2024});
    assert!(codes(&engine, &doc).is_empty());
}
