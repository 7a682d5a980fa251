//! Runtime settings for the orchestrator, derived from configuration.

use std::collections::HashSet;
use std::time::Duration;

use sitekit_config::{Config, FailurePolicy};
use sitekit_core::SiteConfig;
use sitekit_storage::{PathBuilder, StorageModuleLocator};
use sitekit_telemetry::LogConfig;
use tracing::debug;

use crate::error::{KernelError, KernelResult};

/// Settings the orchestrator and its listeners are built with.
#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    /// Modules loaded for every site, ahead of site modules.
    pub core_modules: Vec<String>,
    /// Route parameter carrying the host.
    pub route_host_param: String,
    /// Module failure handling.
    pub failure_policy: FailurePolicy,
    /// Upper bound for each phase.
    pub phase_timeout: Option<Duration>,
    /// Configuration every site starts from.
    pub site_defaults: SiteConfig,
    /// Storage path algebra.
    pub paths: PathBuilder,
    /// Logical root of module storage.
    pub module_root: String,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            core_modules: Vec::new(),
            route_host_param: "host".to_owned(),
            failure_policy: FailurePolicy::Abort,
            phase_timeout: None,
            site_defaults: SiteConfig::new(),
            paths: PathBuilder::default(),
            module_root: "/modules".to_owned(),
        }
    }
}

impl BootstrapSettings {
    /// Build settings from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Storage`] if the path separator is invalid.
    pub fn from_config(config: &Config) -> KernelResult<Self> {
        let paths = PathBuilder::new(&config.storage.path_separator)?;
        let bootstrap = &config.bootstrap;
        Ok(Self {
            core_modules: bootstrap
                .core_modules
                .iter()
                .map(|m| m.trim().to_owned())
                .collect(),
            route_host_param: bootstrap.route_host_param.trim().to_owned(),
            failure_policy: bootstrap.module_failure_policy,
            phase_timeout: bootstrap.phase_timeout_ms.map(Duration::from_millis),
            site_defaults: config.site_defaults.clone(),
            module_root: paths.sanitize(&config.storage.module_root),
            paths,
        })
    }

    /// Set the core modules.
    #[must_use]
    pub fn with_core_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    /// Set the module failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Bound every phase by `timeout`.
    #[must_use]
    pub fn with_phase_timeout(mut self, timeout: Duration) -> Self {
        self.phase_timeout = Some(timeout);
        self
    }

    /// Set the configuration every site starts from.
    #[must_use]
    pub fn with_site_defaults(mut self, defaults: SiteConfig) -> Self {
        self.site_defaults = defaults;
        self
    }

    /// Read the host from a different route parameter.
    #[must_use]
    pub fn with_route_host_param(mut self, param: impl Into<String>) -> Self {
        self.route_host_param = param.into();
        self
    }

    /// Check the settings before the orchestrator is built.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidSetting`] naming the offending setting.
    pub fn validate(&self) -> KernelResult<()> {
        if self.route_host_param.trim().is_empty() {
            return Err(KernelError::InvalidSetting {
                field: "route_host_param",
                message: "must not be empty".to_owned(),
            });
        }
        if self.phase_timeout.is_some_and(|t| t.is_zero()) {
            return Err(KernelError::InvalidSetting {
                field: "phase_timeout",
                message: "must be greater than zero".to_owned(),
            });
        }

        let mut seen = HashSet::new();
        for name in &self.core_modules {
            if name.trim().is_empty() || name.contains(self.paths.separator()) {
                return Err(KernelError::InvalidSetting {
                    field: "core_modules",
                    message: format!("invalid module name {name:?}"),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(KernelError::InvalidSetting {
                    field: "core_modules",
                    message: format!("module {name:?} is listed twice"),
                });
            }
        }
        Ok(())
    }
}

/// Build the module locator described by `[storage]`.
///
/// With `module_dir` set, its subdirectories are the available modules;
/// otherwise the locator starts empty.
///
/// # Errors
///
/// Returns [`KernelError::Storage`] if the separator is invalid or the
/// directory cannot be scanned.
pub fn locator_from_config(config: &Config) -> KernelResult<StorageModuleLocator> {
    let paths = PathBuilder::new(&config.storage.path_separator)?;
    let root = config.storage.module_root.as_str();
    let locator = match &config.storage.module_dir {
        Some(dir) => StorageModuleLocator::scan_directory(paths, root, dir)?,
        None => StorageModuleLocator::new(paths, root),
    };
    debug!(root = locator.root(), "Module locator ready");
    Ok(locator)
}

/// Install the global subscriber described by `[logging]`.
///
/// # Errors
///
/// Returns [`KernelError::Telemetry`] if the section is invalid or a
/// subscriber is already installed.
pub fn init_logging(config: &Config) -> KernelResult<()> {
    let log_config = LogConfig::from_section(&config.logging)?;
    sitekit_telemetry::setup_logging(&log_config)?;
    Ok(())
}
