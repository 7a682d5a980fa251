//! Collaborator traits consumed by the bootstrap pipeline.
//!
//! The pipeline owns none of these concerns; it is wired to concrete
//! implementations when the orchestrator is built.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::module::ModuleManager;
use crate::security::SecurityManager;
use crate::site::{Site, SiteConfig};

/// Content repository lookup for sites.
#[async_trait]
pub trait SiteRepository: Send + Sync {
    /// Find the site answering to `host`.
    ///
    /// Returns `Ok(None)` when no site matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    async fn resolve_by_host(&self, host: &str) -> Result<Option<Site>, BoxError>;

    /// Load the stored configuration of a resolved site.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read.
    async fn site_config(&self, site: &Site) -> Result<SiteConfig, BoxError>;
}

/// Locates module code in module storage.
pub trait ModuleStorageLocator: Send + Sync {
    /// Storage path of the named module, or `None` if storage has no such
    /// module.
    fn locate(&self, name: &str) -> Option<String>;

    /// Whether storage holds the named module.
    fn contains(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }
}

/// Builds module managers for a list of module names.
#[async_trait]
pub trait ModuleManagerFactory: Send + Sync {
    /// Create a manager for `module_names`.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager cannot be constructed.
    async fn create(&self, module_names: &[String]) -> Result<Arc<dyn ModuleManager>, BoxError>;
}

/// Supplies the security manager injected after module loading.
pub trait SecurityManagerProvider: Send + Sync {
    /// The security manager for this process.
    fn security_manager(&self) -> Arc<dyn SecurityManager>;
}
