//! Deep merge of raw TOML trees.
//!
//! Merging happens before deserialization so an absent key never
//! overrides a lower layer.

use std::collections::HashMap;
use std::fmt;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults.
    Defaults,
    /// `/etc/sitekit/config.toml`.
    System,
    /// `~/.sitekit/config.toml`.
    User,
    /// File passed explicitly by the application.
    Explicit,
    /// `SITEKIT_*` environment fallback.
    Environment,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::System => write!(f, "system (/etc/sitekit/config.toml)"),
            Self::User => write!(f, "user (~/.sitekit/config.toml)"),
            Self::Explicit => write!(f, "explicit file"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Dotted field path to the layer that last set it.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording which layer set each leaf.
///
/// Tables merge per key; scalars and arrays replace.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join(prefix, key);
                match base_table.get_mut(key) {
                    Some(base_val) if overlay_val.is_table() => {
                        deep_merge_tracking(base_val, overlay_val, &path, layer, sources);
                    },
                    Some(base_val) => {
                        *base_val = overlay_val.clone();
                        sources.insert(path, layer);
                    },
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                        record_leaves(overlay_val, &path, layer, sources);
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            record_leaves(overlay, prefix, layer, sources);
        },
    }
}

/// Record every leaf under `val` as set by `layer`.
pub fn record_leaves(val: &toml::Value, prefix: &str, layer: ConfigLayer, sources: &mut FieldSources) {
    match val {
        toml::Value::Table(table) => {
            for (key, child) in table {
                record_leaves(child, &join(prefix, key), layer, sources);
            }
        },
        _ => {
            sources.insert(prefix.to_owned(), layer);
        },
    }
}

fn join(prefix: &str, key: &str) -> String {
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
    fn test_overlay_replaces_scalars_and_keeps_siblings() {
        let mut base = parse(
            r#"
            [storage]
            path_separator = "/"
            module_root = "/modules"
        "#,
        );
        let overlay = parse(
            r#"
            [storage]
            module_root = "/srv/modules"
        "#,
        );
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", ConfigLayer::User, &mut sources);

        assert_eq!(base["storage"]["module_root"].as_str(), Some("/srv/modules"));
        assert_eq!(base["storage"]["path_separator"].as_str(), Some("/"));
        assert_eq!(sources.get("storage.module_root"), Some(&ConfigLayer::User));
        assert!(!sources.contains_key("storage.path_separator"));
    }

    #[test]
    fn test_arrays_replace() {
        let mut base = parse(r#"core_modules = ["a", "b"]"#);
        let overlay = parse(r#"core_modules = ["c"]"#);
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", ConfigLayer::System, &mut sources);
        assert_eq!(base["core_modules"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_new_tables_record_all_leaves() {
        let mut base = parse("[bootstrap]");
        let overlay = parse(
            r#"
            [site_defaults.cache]
            ttl = 60
            enabled = true
        "#,
        );
        let mut sources = FieldSources::new();
        deep_merge_tracking(&mut base, &overlay, "", ConfigLayer::Explicit, &mut sources);
        assert_eq!(
            sources.get("site_defaults.cache.ttl"),
            Some(&ConfigLayer::Explicit)
        );
        assert_eq!(
            sources.get("site_defaults.cache.enabled"),
            Some(&ConfigLayer::Explicit)
        );
    }
}
