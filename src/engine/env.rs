//! Canonical evaluation environment built per `evaluate()` call.
//!
//! The resolver projects an arbitrary, possibly legacy-shaped document
//! into a flat map of canonical scalars plus raw sub-objects. Each
//! canonical field is resolved through an explicit ordered chain of
//! dotted paths so old and new document shapes drive the same rule set.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::document::{coerce_number, get_path, number_value};

/// Ordered fallback chain for one canonical field.
///
/// The first path that resolves to a non-null value wins.
pub struct FieldChain {
    pub name: &'static str,
    pub paths: &'static [&'static str],
}

/// Canonical numeric fields: the `amounts.*` location first, then the
/// legacy `wages.*` / `state.*` locations. Missing or unreadable values
/// default to 0.0.
pub const AMOUNT_CHAINS: &[FieldChain] = &[
    FieldChain {
        name: "wages",
        paths: &["amounts.wages", "wages.wages_tips_other"],
    },
    FieldChain {
        name: "federal_withholding",
        paths: &[
            "amounts.federal_withholding",
            "wages.federal_income_tax_withheld",
        ],
    },
    FieldChain {
        name: "state_withholding",
        paths: &["amounts.state_withholding", "state.state_income_tax"],
    },
    FieldChain {
        name: "state_wages",
        paths: &["amounts.state_wages", "state.state_wages"],
    },
    FieldChain {
        name: "social_security_wages",
        paths: &["amounts.social_security_wages", "wages.social_security_wages"],
    },
    FieldChain {
        name: "social_security_tax",
        paths: &[
            "amounts.social_security_tax",
            "wages.social_security_tax_withheld",
        ],
    },
    FieldChain {
        name: "medicare_wages",
        paths: &["amounts.medicare_wages", "wages.medicare_wages"],
    },
    FieldChain {
        name: "medicare_tax",
        paths: &["amounts.medicare_tax", "wages.medicare_tax_withheld"],
    },
];

/// Canonical text fields; unresolved fields bind to null so `missing()`
/// style checks behave uniformly.
pub const TEXT_CHAINS: &[FieldChain] = &[
    FieldChain {
        name: "taxpayer_ssn",
        paths: &["taxpayer.ssn"],
    },
    FieldChain {
        name: "employer_ein",
        paths: &["employer.ein"],
    },
    FieldChain {
        name: "employer_state",
        paths: &["employer.state"],
    },
    FieldChain {
        name: "payer_tin",
        paths: &[
            "payer.tin",
            "payer.ein",
            "payer_info.tin",
            "payer_info.ein",
            "payer_details.tin",
            "payer_details.ein",
        ],
    },
    FieldChain {
        name: "payer_state",
        paths: &["payer.state", "payer_info.state", "payer_details.state"],
    },
    FieldChain {
        name: "recipient_tin",
        paths: &["recipient.tin", "recipient_info.tin"],
    },
];

/// Sub-objects bound by name, with legacy aliases tried in order.
const SUBOBJECT_CHAINS: &[FieldChain] = &[
    FieldChain {
        name: "amounts",
        paths: &["amounts"],
    },
    FieldChain {
        name: "employer",
        paths: &["employer"],
    },
    FieldChain {
        name: "taxpayer",
        paths: &["taxpayer"],
    },
    FieldChain {
        name: "recipient",
        paths: &["recipient", "recipient_info"],
    },
    FieldChain {
        name: "payer",
        paths: &["payer", "payer_info", "payer_details"],
    },
    FieldChain {
        name: "flags",
        paths: &["flags"],
    },
];

/// Per-evaluation environment: canonical scalar bindings, raw
/// sub-objects, and year parameters. Discarded after each call.
pub struct Environment {
    document: Value,
    bindings: HashMap<String, Value>,
    coercion_failures: Vec<&'static str>,
}

impl Environment {
    /// Project a document into the canonical environment.
    pub fn build(
        document: &Value,
        form_type: &str,
        tax_year: Option<i32>,
        year_params: Map<String, Value>,
    ) -> Self {
        let mut bindings = HashMap::new();
        let mut coercion_failures = Vec::new();

        for chain in SUBOBJECT_CHAINS {
            // An empty object does not stop the chain; later aliases
            // still get a chance to supply the real payload.
            let object = chain
                .paths
                .iter()
                .filter_map(|path| get_path(document, path))
                .find(|value| value.as_object().is_some_and(|map| !map.is_empty()))
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            bindings.insert(chain.name.to_string(), object);
        }

        for chain in AMOUNT_CHAINS {
            let raw = chain.paths.iter().find_map(|path| {
                get_path(document, path).filter(|value| !value.is_null())
            });
            let number = match raw {
                Some(value) => coerce_number(value).unwrap_or_else(|| {
                    coercion_failures.push(chain.name);
                    0.0
                }),
                None => 0.0,
            };
            bindings.insert(chain.name.to_string(), number_value(number));
        }

        for chain in TEXT_CHAINS {
            let value = chain
                .paths
                .iter()
                .find_map(|path| get_path(document, path).filter(|v| !v.is_null()))
                .cloned()
                .unwrap_or(Value::Null);
            bindings.insert(chain.name.to_string(), value);
        }

        let ocr_quality = bindings
            .get("flags")
            .and_then(|flags| flags.get("ocr_quality"))
            .and_then(coerce_number)
            .unwrap_or(1.0);
        bindings.insert("ocr_quality".to_string(), number_value(ocr_quality));

        bindings.insert("form_type".to_string(), Value::String(form_type.to_string()));
        bindings.insert(
            "tax_year".to_string(),
            tax_year.map_or(Value::Null, |year| Value::Number(year.into())),
        );
        bindings.insert("year_params".to_string(), Value::Object(year_params));

        if !coercion_failures.is_empty() {
            tracing::debug!(fields = ?coercion_failures, "lenient coercion defaulted fields to zero");
        }

        Self {
            document: document.clone(),
            bindings,
            coercion_failures,
        }
    }

    /// Look up a bare environment binding. `doc` resolves to the raw
    /// document.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if name == "doc" {
            return Some(&self.document);
        }
        self.bindings.get(name)
    }

    /// Resolve a dotted path rooted at an environment binding.
    ///
    /// Returns `None` when the root binding is unknown or any later
    /// segment misses; condition evaluation maps that to null.
    pub fn resolve_path(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            Some((root, rest)) => get_path(self.get(root)?, rest),
            None => self.get(path),
        }
    }

    /// Raw document, for `get()`/`exists()` helpers.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Canonical fields whose values existed but could not be read as
    /// numbers and were defaulted to zero.
    pub fn coercion_failures(&self) -> &[&'static str] {
        &self.coercion_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(document: Value) -> Environment {
        Environment::build(&document, "W2", Some(2024), Map::new())
    }

    #[test]
    fn test_canonical_amount_path() {
        let env = build(json!({"amounts": {"wages": 85000}}));
        assert_eq!(env.get("wages"), Some(&json!(85000.0)));
    }

    #[test]
    fn test_legacy_amount_path_equivalent() {
        let canonical = build(json!({"amounts": {"social_security_tax": 5270}}));
        let legacy = build(json!({"wages": {"social_security_tax_withheld": 5270}}));
        assert_eq!(
            canonical.get("social_security_tax"),
            legacy.get("social_security_tax")
        );
    }

    #[test]
    fn test_canonical_path_wins_over_legacy() {
        let env = build(json!({
            "amounts": {"wages": 100.0},
            "wages": {"wages_tips_other": 999.0},
        }));
        assert_eq!(env.get("wages"), Some(&json!(100.0)));
    }

    #[test]
    fn test_missing_amount_defaults_to_zero() {
        let env = build(json!({}));
        assert_eq!(env.get("wages"), Some(&json!(0.0)));
        assert_eq!(env.get("federal_withholding"), Some(&json!(0.0)));
    }

    #[test]
    fn test_unreadable_amount_recorded_and_zeroed() {
        let env = build(json!({"amounts": {"wages": "eighty-five thousand"}}));
        assert_eq!(env.get("wages"), Some(&json!(0.0)));
        assert_eq!(env.coercion_failures(), &["wages"]);
    }

    #[test]
    fn test_payer_subobject_fallback() {
        let env = build(json!({"payer_details": {"tin": "12-3456789"}}));
        assert_eq!(env.get("payer_tin"), Some(&json!("12-3456789")));
        assert_eq!(env.get("payer").unwrap()["tin"], json!("12-3456789"));
    }

    #[test]
    fn test_empty_payer_object_falls_through_to_alias() {
        let env = build(json!({
            "payer": {},
            "payer_info": {"tin": "12-3456789"},
        }));
        assert_eq!(env.get("payer").unwrap()["tin"], json!("12-3456789"));
        assert_eq!(env.resolve_path("payer.tin"), Some(&json!("12-3456789")));
    }

    #[test]
    fn test_payer_tin_falls_back_to_ein() {
        let env = build(json!({"payer": {"ein": "12-3456789"}}));
        assert_eq!(env.get("payer_tin"), Some(&json!("12-3456789")));
    }

    #[test]
    fn test_text_field_defaults_to_null() {
        let env = build(json!({}));
        assert_eq!(env.get("taxpayer_ssn"), Some(&Value::Null));
    }

    #[test]
    fn test_ocr_quality_defaults_to_one() {
        let env = build(json!({}));
        assert_eq!(env.get("ocr_quality"), Some(&json!(1.0)));
        let env = build(json!({"flags": {"ocr_quality": 0.5}}));
        assert_eq!(env.get("ocr_quality"), Some(&json!(0.5)));
    }

    #[test]
    fn test_doc_binding_and_dotted_resolution() {
        let env = build(json!({"taxpayer": {"ssn": "123-45-6789"}}));
        assert_eq!(
            env.resolve_path("doc.taxpayer.ssn"),
            Some(&json!("123-45-6789"))
        );
        assert_eq!(env.resolve_path("taxpayer.ssn"), Some(&json!("123-45-6789")));
        assert_eq!(env.resolve_path("taxpayer.missing"), None);
        assert_eq!(env.resolve_path("unknown_root.x"), None);
    }

    #[test]
    fn test_year_params_binding() {
        let mut params = Map::new();
        params.insert("limits".to_string(), json!({"social_security_wage_base": 168600}));
        let env = Environment::build(&json!({}), "W2", Some(2024), params);
        assert_eq!(
            env.resolve_path("year_params.limits.social_security_wage_base"),
            Some(&json!(168600))
        );
    }

    #[test]
    fn test_form_type_and_tax_year_bindings() {
        let env = build(json!({}));
        assert_eq!(env.get("form_type"), Some(&json!("W2")));
        assert_eq!(env.get("tax_year"), Some(&json!(2024)));
        let env = Environment::build(&json!({}), "W2", None, Map::new());
        assert_eq!(env.get("tax_year"), Some(&Value::Null));
    }
}
