//! Environment variable fallbacks.
//!
//! Environment variables are a fallback, not an override: they apply only
//! to fields no config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    section: &'static str,
    key: &'static str,
    kind: ValueKind,
}

#[derive(Clone, Copy)]
enum ValueKind {
    String,
    Integer,
}

/// Log level fallback.
pub const LOG_LEVEL_VAR: &str = "MOSAIC_LOG_LEVEL";
/// Request timeout fallback, in milliseconds.
pub const REQUEST_TIMEOUT_VAR: &str = "MOSAIC_REQUEST_TIMEOUT_MS";

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: LOG_LEVEL_VAR,
        section: "logging",
        key: "level",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: REQUEST_TIMEOUT_VAR,
        section: "messaging",
        key: "request_timeout_ms",
        kind: ValueKind::Integer,
    },
];

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply environment fallbacks to fields not set by a config file.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a variable cannot be converted to
/// its field's type.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let path = format!("{}.{}", mapping.section, mapping.key);
        if sources
            .get(&path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults)
        {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let value = coerce(mapping, raw)?;
        debug!(var = mapping.var_name, field = %path, "applying env var fallback");

        let Some(root) = merged.as_table_mut() else {
            continue;
        };
        let section = root
            .entry(mapping.section)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        if let Some(table) = section.as_table_mut() {
            table.insert(mapping.key.to_owned(), value);
            sources.insert(path, ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    Ok(count)
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    let raw = raw.trim();
    match mapping.kind {
        ValueKind::String => Ok(toml::Value::String(raw.to_owned())),
        ValueKind::Integer => raw
            .parse::<i64>()
            .map(toml::Value::Integer)
            .map_err(|e| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected an integer, got '{raw}': {e}"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn base() -> (toml::Value, FieldSources) {
        let merged: toml::Value = toml::from_str(
            r#"
            [logging]
            level = "info"
            [messaging]
            request_timeout_ms = 5000
            "#,
        )
        .unwrap();
        let mut sources = FieldSources::new();
        crate::merge::record_leaves(&merged, "", ConfigLayer::Defaults, &mut sources);
        (merged, sources)
    }

    #[test]
    fn test_env_overrides_defaults() {
        let (mut merged, mut sources) = base();
        let env = make_env(&[(LOG_LEVEL_VAR, "debug"), (REQUEST_TIMEOUT_VAR, " 250 ")]);

        let applied = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();
        assert_eq!(applied, 2);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(merged["messaging"]["request_timeout_ms"].as_integer(), Some(250));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::Environment));
    }

    #[test]
    fn test_env_does_not_override_file() {
        let (mut merged, mut sources) = base();
        sources.insert("logging.level".to_owned(), ConfigLayer::User);
        let env = make_env(&[(LOG_LEVEL_VAR, "trace")]);

        let applied = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();
        assert_eq!(applied, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("info"));
    }

    #[test]
    fn test_bad_integer_is_an_env_error() {
        let (mut merged, mut sources) = base();
        let env = make_env(&[(REQUEST_TIMEOUT_VAR, "soon")]);

        let err = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap_err();
        assert!(matches!(err, ConfigError::EnvError { ref var_name, .. } if var_name == REQUEST_TIMEOUT_VAR));
    }

    #[test]
    fn test_unrelated_vars_ignored() {
        let (mut merged, mut sources) = base();
        let env = make_env(&[("HOME", "/home/user")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap(), 0);
    }
}
