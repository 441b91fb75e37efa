//! Programmatic W-2 rules merged through the registry extension hook.
//!
//! The masked-SSN family builds its condition from a pattern union,
//! which is awkward to keep in sync by hand in YAML.

use super::{Condition, Reference, RuleDefinition, Severity};

/// Accepted SSN shapes, including the masked forms extraction produces.
const MASKED_SSN_PATTERNS: &[&str] = &[
    r"\d{3}-?\d{2}-?\d{4}",
    r"X{3}-?X{2}-?\d{4}",
    r"\d{3}-?\d{2}-?X{4}",
    r"XXX-XX-\d{4}",
];

fn pattern_union(patterns: &[&str]) -> String {
    format!("^({})$", patterns.join("|"))
}

/// Extension rules appended after the declarative W-2 set.
pub fn rules() -> Vec<RuleDefinition> {
    vec![
        RuleDefinition {
            id: "W2_SSN_MASKED_FORMAT".to_string(),
            form_types: vec!["W2".to_string()],
            name: "Taxpayer SSN not in a valid or masked format".to_string(),
            severity: Severity::Warning,
            description: "Taxpayer SSN is missing or not in a valid or masked format."
                .to_string(),
            condition: Condition {
                kind: "expression".to_string(),
                expr: format!(
                    "not re_match('{}', taxpayer_ssn or '')",
                    pattern_union(MASKED_SSN_PATTERNS)
                ),
            },
            references: vec![Reference {
                source: "IRS W-2 Instructions".to_string(),
                url: "https://www.irs.gov/forms-pubs/about-form-w-2".to_string(),
            }],
            fields: vec!["taxpayer.ssn".to_string()],
            field_paths: Vec::new(),
            category: Some("identity".to_string()),
            rule_type: None,
            summary: None,
            tags: vec!["ssn".to_string()],
            tax_years: None,
            extras: None,
            hint: None,
            source: Some("w2_extended".to_string()),
        },
        RuleDefinition {
            id: "W2_BOX1_VS_BOX3_RELATION".to_string(),
            form_types: vec!["W2".to_string()],
            name: "Box 1 wages differ from Social Security wages".to_string(),
            severity: Severity::Info,
            description:
                "Box 1 wages {wages} differ from Social Security wages {social_security_wages}; pre-tax deductions may apply."
                    .to_string(),
            condition: Condition {
                kind: "expression".to_string(),
                expr: "wages > 0 and not within_tolerance(wages, social_security_wages, as_number(year_params.tolerance, 1.0))"
                    .to_string(),
            },
            references: vec![Reference {
                source: "IRS W-2 Instructions".to_string(),
                url: "https://www.irs.gov/forms-pubs/about-form-w-2".to_string(),
            }],
            fields: vec![
                "amounts.wages".to_string(),
                "amounts.social_security_wages".to_string(),
            ],
            field_paths: Vec::new(),
            category: Some("arithmetic".to_string()),
            rule_type: Some("relation".to_string()),
            summary: None,
            tags: vec!["wages".to_string()],
            tax_years: None,
            extras: None,
            hint: Some("Compare Box 1 against Boxes 3 and 5 for pre-tax deductions.".to_string()),
            source: Some("w2_extended".to_string()),
        },
    ]
}
