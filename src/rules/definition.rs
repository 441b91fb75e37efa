use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity of a rule or finding
///
/// Unknown values in authored rule files fall back to `Warning` rather
/// than failing the load.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Critical,
    #[default]
    #[serde(other)]
    Warning,
}

/// External citation attached to a rule
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Reference {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: String,
}

/// Condition block of a rule definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Condition {
    #[serde(rename = "type", default = "default_condition_type")]
    pub kind: String,
    #[serde(default)]
    pub expr: String,
}

fn default_condition_type() -> String {
    "expression".to_string()
}

/// Declarative audit rule, immutable once loaded
///
/// Most keys are optional for rule authors; the issue builder supplies
/// deterministic defaults when a finding is emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleDefinition {
    pub id: String,
    #[serde(default)]
    pub form_types: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
    #[serde(default)]
    pub references: Vec<Reference>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub field_paths: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rule_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Years the rule is restricted to. Kept untyped so a single
    /// unparseable entry disables the filter instead of failing the load.
    #[serde(default)]
    pub tax_years: Option<Vec<Value>>,
    #[serde(default)]
    pub extras: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub hint: Option<String>,
    /// Source filename, injected by the loader for provenance.
    #[serde(default, rename = "_source")]
    pub source: Option<String>,
}

impl RuleDefinition {
    /// Whether this rule applies to the resolved tax year.
    ///
    /// No `tax_years` restriction means the rule always applies. If any
    /// declared entry is not an integer the filter is disabled. A rule
    /// with a valid restriction never fires when the document carries no
    /// resolvable year.
    pub fn matches_year(&self, tax_year: Option<i32>) -> bool {
        let years = match &self.tax_years {
            Some(years) if !years.is_empty() => years,
            _ => return true,
        };
        let mut allowed = Vec::with_capacity(years.len());
        for entry in years {
            match year_from_value(entry) {
                Some(year) => allowed.push(year),
                None => return true,
            }
        }
        match tax_year {
            Some(year) => allowed.contains(&year),
            None => false,
        }
    }
}

fn year_from_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().map(|y| y as i32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
