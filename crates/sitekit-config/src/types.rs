//! Configuration struct definitions.
//!
//! Every section uses `#[serde(default)]` so a partial file deserializes
//! cleanly; missing values come from [`Default`], which mirrors
//! `defaults.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bootstrap pipeline behaviour.
    pub bootstrap: BootstrapSection,
    /// Module storage layout.
    pub storage: StorageSection,
    /// Logging.
    pub logging: LoggingSection,
    /// Configuration inherited by every site before its own settings.
    pub site_defaults: serde_json::Map<String, serde_json::Value>,
}

/// What the loader does when a module fails to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fail the whole bootstrap.
    #[default]
    Abort,
    /// Log the failure and continue with the remaining modules.
    Skip,
}

/// `[bootstrap]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSection {
    /// Modules loaded for every site, ahead of the site's own.
    pub core_modules: Vec<String>,
    /// Route parameter carrying the request host.
    pub route_host_param: String,
    /// Module failure handling.
    pub module_failure_policy: FailurePolicy,
    /// Upper bound for a single phase, in milliseconds. Unbounded if unset.
    pub phase_timeout_ms: Option<u64>,
}

impl Default for BootstrapSection {
    fn default() -> Self {
        Self {
            core_modules: Vec::new(),
            route_host_param: "host".to_owned(),
            module_failure_policy: FailurePolicy::Abort,
            phase_timeout_ms: None,
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Separator used by the storage path algebra.
    pub path_separator: String,
    /// Logical root under which modules live.
    pub module_root: String,
    /// Local directory to scan for installed modules.
    pub module_dir: Option<PathBuf>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            path_separator: "/".to_owned(),
            module_root: "/modules".to_owned(),
            module_dir: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default level (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format (`pretty`, `compact`, `json`, `full`).
    pub format: String,
    /// Extra per-target filter directives, e.g. `sitekit_kernel=debug`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}
