//! Stack variables loading
//!
//! Variables are a flat YAML mapping, given either as a file path or inline.

use crate::error::{DeployError, Result};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Resolve the `--stack-vars` input.
///
/// An existing file path is read and parsed, any other non-empty value is
/// parsed as inline YAML.
pub fn resolve_vars(input: Option<&str>) -> Result<BTreeMap<String, String>> {
    let input = match input {
        Some(input) if !input.trim().is_empty() => input,
        _ => return Ok(BTreeMap::new()),
    };

    let path = Path::new(input);
    if path.is_file() {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeployError::InvalidConfig(format!(
                "Failed to read vars file {}: {}",
                path.display(),
                e
            ))
        })?;
        return parse_vars(&content);
    }

    parse_vars(input)
}

/// Parse a YAML mapping of variables. Scalar values are stringified.
pub fn parse_vars(content: &str) -> Result<BTreeMap<String, String>> {
    let document: Value = serde_yaml::from_str(content)?;

    let mapping = match document {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(DeployError::InvalidConfig(
                "Stack vars must be a YAML mapping".to_string(),
            ))
        }
    };

    let mut vars = BTreeMap::new();
    for (key, value) in &mapping {
        let name = match key {
            Value::Null => None,
            other => scalar_to_string(other),
        }
        .ok_or_else(|| {
            DeployError::InvalidConfig(format!("Invalid stack variable name: {:?}", key))
        })?;

        let value = scalar_to_string(value).ok_or_else(|| {
            DeployError::InvalidConfig(format!("Stack variable '{}' must be a scalar", name))
        })?;

        vars.insert(name, value);
    }

    Ok(vars)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
