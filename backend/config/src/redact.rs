//! Config redaction: produce safe-to-share config snapshots by masking sensitive fields.

use serde_json::Value;

/// Keys whose string values are secrets.
static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "apikey",
    "token",
    "accessToken",
    "access_token",
    "secret",
    "password",
];

/// Copy of `value` with every secret masked to a short prefix hint.
///
/// Safe to log or print from `config show`. Unresolved `${VAR}` references
/// stay visible since they name a variable rather than hold a secret.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(key, field)| {
                    let masked = match field {
                        Value::String(s) if is_secret(key, s) => Value::String(mask(s)),
                        other => redact(other),
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Dotted paths of every field [`redact`] would mask.
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    walk_secrets(value, "", &mut paths);
    paths
}

fn is_secret(key: &str, value: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
        && !value.is_empty()
        && !value.starts_with("${")
}

fn mask(secret: &str) -> String {
    if secret.chars().count() > 8 {
        let prefix: String = secret.chars().take(4).collect();
        format!("{prefix}***")
    } else {
        "***".to_string()
    }
}

fn walk_secrets(value: &Value, path: &str, out: &mut Vec<String>) {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields {
                let child = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                match field {
                    Value::String(s) if is_secret(key, s) => out.push(child),
                    other => walk_secrets(other, &child, out),
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                walk_secrets(item, &format!("{path}[{i}]"), out);
            }
        }
        _ => {}
    }
}
