//! `SITEKIT_*` environment fallbacks.
//!
//! A variable only applies when no config file set the field; values from
//! the embedded defaults do not count as set.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    /// Comma separated, blanks dropped.
    List,
    Integer,
}

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: Kind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "SITEKIT_CORE_MODULES",
        field_path: "bootstrap.core_modules",
        kind: Kind::List,
    },
    EnvMapping {
        var_name: "SITEKIT_ROUTE_HOST_PARAM",
        field_path: "bootstrap.route_host_param",
        kind: Kind::Text,
    },
    EnvMapping {
        var_name: "SITEKIT_MODULE_FAILURE_POLICY",
        field_path: "bootstrap.module_failure_policy",
        kind: Kind::Text,
    },
    EnvMapping {
        var_name: "SITEKIT_PHASE_TIMEOUT_MS",
        field_path: "bootstrap.phase_timeout_ms",
        kind: Kind::Integer,
    },
    EnvMapping {
        var_name: "SITEKIT_PATH_SEPARATOR",
        field_path: "storage.path_separator",
        kind: Kind::Text,
    },
    EnvMapping {
        var_name: "SITEKIT_MODULE_ROOT",
        field_path: "storage.module_root",
        kind: Kind::Text,
    },
    EnvMapping {
        var_name: "SITEKIT_MODULE_DIR",
        field_path: "storage.module_dir",
        kind: Kind::Text,
    },
    EnvMapping {
        var_name: "SITEKIT_LOG_LEVEL",
        field_path: "logging.level",
        kind: Kind::Text,
    },
    EnvMapping {
        var_name: "SITEKIT_LOG_FORMAT",
        field_path: "logging.format",
        kind: Kind::Text,
    },
];

/// Snapshot the process environment's `SITEKIT_*` variables.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("SITEKIT_"))
        .collect()
}

/// Apply environment fallbacks to the merged tree.
///
/// Returns the number of fields set.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] when an integer variable does not parse.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        let value = convert(mapping, raw)?;
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn convert(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    Ok(match mapping.kind {
        Kind::Text => toml::Value::String(raw.trim().to_owned()),
        Kind::List => toml::Value::Array(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_owned()))
                .collect(),
        ),
        Kind::Integer => {
            let n: i64 = raw.trim().parse().map_err(|e| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected an integer: {e}"),
            })?;
            toml::Value::Integer(n)
        },
    })
}

/// Set a dotted field path, creating intermediate tables as needed.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let toml::Value::Table(table) = root else {
        return;
    };
    match path.split_once('.') {
        None => {
            table.insert(path.to_owned(), value);
        },
        Some((head, rest)) => {
            let child = table
                .entry(head.to_owned())
                .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
            set_field(child, rest, value);
        },
    }
}
