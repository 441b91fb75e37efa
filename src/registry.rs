//! In-memory index of loaded rules and year parameters.
//!
//! Immutable after construction; many callers may evaluate against a
//! shared registry concurrently without locking.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::loader::RuleCatalog;
use crate::rules::RuleDefinition;

/// Indexes rules by form type and stores per-year parameters.
pub struct RuleRegistry {
    rules: Vec<Arc<RuleDefinition>>,
    by_form: HashMap<String, Vec<Arc<RuleDefinition>>>,
    year_parameters: BTreeMap<i32, Map<String, Value>>,
}

impl RuleRegistry {
    /// Build a registry from a loaded catalog.
    pub fn new(catalog: RuleCatalog) -> Self {
        Self::with_extensions(catalog, Vec::new())
    }

    /// Build a registry with additional programmatic rules merged after
    /// the declarative set. Used for rule families too dynamic to
    /// express in YAML.
    pub fn with_extensions(catalog: RuleCatalog, extensions: Vec<RuleDefinition>) -> Self {
        let rules: Vec<Arc<RuleDefinition>> = catalog
            .rules
            .into_iter()
            .chain(extensions)
            .map(Arc::new)
            .collect();

        let mut by_form: HashMap<String, Vec<Arc<RuleDefinition>>> = HashMap::new();
        for rule in &rules {
            for form in &rule.form_types {
                if form.is_empty() {
                    continue;
                }
                by_form
                    .entry(form.to_uppercase())
                    .or_default()
                    .push(Arc::clone(rule));
            }
        }

        Self {
            rules,
            by_form,
            year_parameters: catalog.year_parameters,
        }
    }

    /// Rules indexed under a form type, case-insensitive. Unknown form
    /// types yield an empty slice, not an error.
    pub fn rules_for(&self, form_type: &str) -> &[Arc<RuleDefinition>] {
        self.by_form
            .get(&form_type.to_uppercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Year parameters with a `_year` marker injected, or an empty map
    /// when the year is unsupported. The permissive variant: callers
    /// needing a hard failure use [`Self::context_for_year`].
    pub fn year_params(&self, tax_year: Option<i32>) -> Map<String, Value> {
        let Some(year) = tax_year else {
            return Map::new();
        };
        match self.year_parameters.get(&year) {
            Some(params) => {
                let mut params = params.clone();
                params.insert("_year".to_string(), Value::Number(year.into()));
                params
            }
            None => Map::new(),
        }
    }

    /// Strict year lookup: errors with a year-identifying message when
    /// the year has no loaded parameters.
    pub fn context_for_year(&self, year: i32) -> Result<&Map<String, Value>, ConfigError> {
        self.year_parameters
            .get(&year)
            .ok_or(ConfigError::UnsupportedYear(year))
    }

    /// Sorted list of loaded parameter years.
    pub fn supported_years(&self) -> Vec<i32> {
        self.year_parameters.keys().copied().collect()
    }

    /// Total number of loaded rules across all form types.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Check if the registry holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Ids of all loaded rules, in discovery order.
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.id.as_str()).collect()
    }
}
