//! Environment variable substitution for config values.
//!
//! Supports `${VAR_NAME}` syntax in string values, resolved at load time.
//! Only uppercase `[A-Z_][A-Z0-9_]*` variable names are matched.
//! `$${}` escapes to a literal `${}`.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// A reference with an optional leading escape `$`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config JSON value tree.
///
/// Only string leaves are rewritten. Fails on the first reference whose
/// variable is unset or empty.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Same as [`resolve_env_vars`] against an explicit variable map.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    map_strings(value, "", &|s, path| substitute(s, env, path))
}

/// Rebuild `value`, passing every string leaf and its dotted path through `f`.
fn map_strings<F>(value: &Value, path: &str, f: &F) -> Result<Value>
where
    F: Fn(&str, &str) -> Result<String>,
{
    Ok(match value {
        Value::String(s) => Value::String(f(s, path)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| map_strings(item, &format!("{path}[{i}]"), f))
                .collect::<Result<_>>()?,
        ),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| Ok((key.clone(), map_strings(field, &join_path(path, key), f)?)))
                .collect::<Result<_>>()?,
        ),
        scalar => scalar.clone(),
    })
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn substitute(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    let mut missing = None;
    let replaced = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures<'_>| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name).filter(|v| !v.is_empty()) {
            Some(v) => v.clone(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(var_name) => Err(MissingEnvVarError {
            var_name,
            config_path: path.to_string(),
        }
        .into()),
        None => Ok(replaced.into_owned()),
    }
}

/// Every variable name referenced by the tree, sorted and deduplicated.
/// Escaped `$${VAR}` references are skipped.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut names = Vec::new();
    visit_strings(value, &mut |s| {
        names.extend(
            ENV_VAR_PATTERN
                .captures_iter(s)
                .filter(|caps| caps[1].is_empty())
                .map(|caps| caps[2].to_string()),
        )
    });
    names.sort();
    names.dedup();
    names
}

fn visit_strings(value: &Value, f: &mut impl FnMut(&str)) {
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => {
            for item in items {
                visit_strings(item, f);
            }
        }
        Value::Object(fields) => {
            for field in fields.values() {
                visit_strings(field, f);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_simple_var() {
        let v = json!({"vision": {"apiKey": "${GEMINI_API_KEY}"}});
        let env = env(&[("GEMINI_API_KEY", "AIza-test")]);
        let result = resolve_env_vars_with(&v, &env).unwrap();
        assert_eq!(result["vision"]["apiKey"], "AIza-test");
    }

    #[test]
    fn error_on_missing_var() {
        let v = json!({"vision": {"apiKey": "${MISSING_VAR}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("MISSING_VAR"));
        assert!(msg.contains("vision.apiKey"));
    }

    #[test]
    fn empty_var_counts_as_missing() {
        let v = json!({"key": "${EMPTY}"});
        assert!(resolve_env_vars_with(&v, &env(&[("EMPTY", "")])).is_err());
    }

    #[test]
    fn escaped_reference_is_kept_literal() {
        let v = json!({"key": "$${HOME_DIR}/x and ${NAME}"});
        let result = resolve_env_vars_with(&v, &env(&[("NAME", "n")])).unwrap();
        assert_eq!(result["key"], "${HOME_DIR}/x and n");
    }

    #[test]
    fn passthrough_non_var_strings_and_numbers() {
        let v = json!({"key": "plain-string", "port": 8080});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result["key"], "plain-string");
        assert_eq!(result["port"], 8080);
    }

    #[test]
    fn collects_referenced_vars_skipping_escapes() {
        let v = json!({"a": "${FOO}", "b": {"c": "${BAR} $${BAZ}"}});
        let vars = collect_referenced_vars(&v);
        assert_eq!(vars, vec!["BAR".to_string(), "FOO".to_string()]);
    }
}
