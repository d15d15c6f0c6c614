//! Deep merge of TOML value trees.
//!
//! Merging raw [`toml::Value`]s rather than deserialized structs keeps
//! "absent" distinct from "default": a key missing from an overlay never
//! overrides the base layer.

use std::collections::BTreeMap;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// The user's configuration file.
    User,
    /// Environment variable fallback.
    Environment,
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user config file"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Tracks which layer set each leaf field, keyed by dotted path.
pub type FieldSources = BTreeMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording the layer of every leaf the
/// overlay sets.
///
/// Tables merge per key. Scalars and arrays from the overlay replace the
/// base value.
pub fn deep_merge(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join_path(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val, &path, layer, sources);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            record_leaves(overlay, prefix, layer, sources);
        },
    }
}

/// Record every leaf under `val` as coming from `layer`.
pub fn record_leaves(val: &toml::Value, prefix: &str, layer: ConfigLayer, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer);
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_only_named_keys() {
        let mut base = parse(
            r"
            [resources]
            warning_ratio = 0.8
            sample_interval_secs = 30
            ",
        );
        let overlay = parse(
            r"
            [resources]
            sample_interval_secs = 5
            ",
        );

        let mut sources = FieldSources::new();
        deep_merge(&mut base, &overlay, "", ConfigLayer::User, &mut sources);

        assert_eq!(base["resources"]["sample_interval_secs"].as_integer(), Some(5));
        assert_eq!(base["resources"]["warning_ratio"].as_float(), Some(0.8));
        assert_eq!(
            sources.get("resources.sample_interval_secs"),
            Some(&ConfigLayer::User)
        );
        assert!(!sources.contains_key("resources.warning_ratio"));
    }

    #[test]
    fn test_new_tables_are_recorded() {
        let mut base = parse("[focus]\nhistory_capacity = 10\n");
        let overlay = parse("[logging]\nlevel = \"debug\"\n");

        let mut sources = FieldSources::new();
        deep_merge(&mut base, &overlay, "", ConfigLayer::User, &mut sources);

        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::User));
    }

    #[test]
    fn test_arrays_replace() {
        let mut base = parse("[logging]\ndirectives = [\"a=debug\", \"b=warn\"]\n");
        let overlay = parse("[logging]\ndirectives = [\"c=trace\"]\n");

        let mut sources = FieldSources::new();
        deep_merge(&mut base, &overlay, "", ConfigLayer::User, &mut sources);

        let directives = base["logging"]["directives"].as_array().unwrap();
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].as_str(), Some("c=trace"));
    }
}
