//! Module manager abstraction.

use std::fmt;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::service::ServiceRegistry;

/// Loads extension modules into the running process.
///
/// A manager is created per request for the module names collected for the
/// site. Implementations register the services a module provides into the
/// supplied registry.
#[async_trait]
pub trait ModuleManager: Send + Sync + fmt::Debug {
    /// Module names this manager was created for, in load order.
    fn module_names(&self) -> Vec<String>;

    /// Load one module and register its services.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the module cannot be resolved or
    /// initialized.
    async fn load_module(&self, name: &str, services: &ServiceRegistry) -> Result<(), BoxError>;

    /// Whether this manager has loaded the module.
    fn is_loaded(&self, name: &str) -> bool;
}
