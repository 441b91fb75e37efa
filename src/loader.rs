//! Loading of declarative rule files and per-year parameter files.
//!
//! Loading produces an explicit, immutable [`RuleCatalog`] that is
//! handed to the registry at construction. There is no process-global
//! cache: tests build fresh catalogs, production builds one per process
//! and restarts to pick up rule-source changes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::rules::RuleDefinition;

/// Keys every year-parameter file must define.
const REQUIRED_YEAR_KEYS: &[&str] = &[
    "limits.social_security_wage_base",
    "rates.social_security_rate",
    "rates.medicare_rate",
];

/// Fully-loaded rule and parameter catalog, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    pub rules: Vec<RuleDefinition>,
    pub year_parameters: BTreeMap<i32, Map<String, Value>>,
}

impl RuleCatalog {
    /// Load rules and year parameters from their source directories.
    pub fn load(rules_dir: &Path, params_dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            rules: load_all_rules(rules_dir)?,
            year_parameters: load_year_parameters(params_dir)?,
        })
    }
}

/// Whether a file participates in the core rule set.
///
/// Only the core rule files are loaded so legacy catalogues sitting in
/// the same directory cannot leak into evaluation.
fn is_supported_rule_file(name: &str) -> bool {
    name == "1040_recon.yaml" || name.ends_with("_core.yaml")
}

/// Load every supported rule file in `dir`, in sorted filename order.
///
/// Each record is tagged with its source filename for provenance.
/// Records that do not deserialize are skipped with a warning rather
/// than failing the whole load.
pub fn load_all_rules(dir: &Path) -> Result<Vec<RuleDefinition>, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::RulesDirNotFound(dir.to_path_buf()));
    }

    let mut rules = Vec::new();
    for path in sorted_yaml_files(dir)? {
        let name = file_name(&path);
        if !is_supported_rule_file(&name) {
            continue;
        }
        let raw = read_yaml(&path)?;
        for record in normalize_rule_records(raw) {
            match serde_json::from_value::<RuleDefinition>(record) {
                Ok(mut rule) => {
                    rule.source = Some(name.clone());
                    rules.push(rule);
                }
                Err(error) => {
                    tracing::warn!(file = %name, %error, "skipping malformed rule record");
                }
            }
        }
    }

    tracing::debug!(count = rules.len(), dir = %dir.display(), "loaded rule definitions");
    Ok(rules)
}

/// Load one parameter file per tax year, validating the required-key
/// schema. A malformed filename, non-mapping payload, missing key, or
/// an empty directory is fatal.
pub fn load_year_parameters(
    dir: &Path,
) -> Result<BTreeMap<i32, Map<String, Value>>, ConfigError> {
    if !dir.is_dir() {
        return Err(ConfigError::ParamsDirNotFound(dir.to_path_buf()));
    }

    let mut parameters = BTreeMap::new();
    for path in sorted_yaml_files(dir)? {
        let name = file_name(&path);
        let year: i32 = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse().ok())
            .ok_or_else(|| ConfigError::InvalidYearFilename(name.clone()))?;

        let raw = read_yaml(&path)?;
        let mut entry = raw
            .as_object()
            .cloned()
            .ok_or_else(|| ConfigError::ParamsNotAMapping(name.clone()))?;

        // A file may nest its payload under a single `<year>:` key.
        if entry.len() == 1 {
            if let Some(nested) = entry.get(&year.to_string()) {
                entry = nested
                    .as_object()
                    .cloned()
                    .ok_or_else(|| ConfigError::ParamsNotAMapping(name.clone()))?;
            }
        }

        validate_year_entry(year, &entry)?;
        parameters.insert(year, entry);
    }

    if parameters.is_empty() {
        return Err(ConfigError::NoYearsFound(dir.to_path_buf()));
    }

    tracing::debug!(years = ?parameters.keys().collect::<Vec<_>>(), "loaded year parameters");
    Ok(parameters)
}

fn validate_year_entry(year: i32, entry: &Map<String, Value>) -> Result<(), ConfigError> {
    let value = Value::Object(entry.clone());
    let missing: Vec<&str> = REQUIRED_YEAR_KEYS
        .iter()
        .copied()
        .filter(|key| crate::engine::document::get_path(&value, key).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingRequiredKeys {
            year,
            missing: missing.join(", "),
        })
    }
}

/// Flatten a parsed rule file into individual record values.
///
/// Accepts a bare list or a mapping wrapped in a `rules`/`data` key;
/// anything else contributes nothing. Non-mapping entries are dropped.
fn normalize_rule_records(raw: Value) -> Vec<Value> {
    let records = match raw {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("rules").or_else(|| map.remove("data")) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    records.into_iter().filter(Value::is_object).collect()
}

fn sorted_yaml_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = fs::read_dir(dir).map_err(|source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("yaml"))
        .collect();
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_yaml(path: &Path) -> Result<Value, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(yaml_to_json(yaml))
}

/// Convert parsed YAML to JSON, stringifying mapping keys so year-keyed
/// files (`2024:`) survive the conversion.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, entry) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                object.insert(key, yaml_to_json(entry));
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}
