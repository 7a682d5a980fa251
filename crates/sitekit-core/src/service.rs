//! Process-wide service registry and injection capabilities.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::BoxError;
use crate::module::ModuleManager;
use crate::security::SecurityManager;

/// A service that wants the module manager once modules are loaded.
pub trait WantsModuleManager: Send + Sync {
    /// Receive the module manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot accept the reference.
    fn set_module_manager(&self, manager: Arc<dyn ModuleManager>) -> Result<(), BoxError>;
}

/// A service that wants the security manager once modules are loaded.
pub trait WantsSecurityManager: Send + Sync {
    /// Receive the security manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot accept the reference.
    fn set_security_manager(&self, manager: Arc<dyn SecurityManager>) -> Result<(), BoxError>;
}

/// A service held in the [`ServiceRegistry`].
///
/// Services opt into late injection by returning themselves from the
/// capability accessors.
pub trait Service: Send + Sync {
    /// This service as a module manager injection target.
    fn module_manager_aware(&self) -> Option<&dyn WantsModuleManager> {
        None
    }

    /// This service as a security manager injection target.
    fn security_manager_aware(&self) -> Option<&dyn WantsSecurityManager> {
        None
    }
}

/// Process-wide map of named services.
///
/// Safe to share between concurrent bootstrap runs.
#[derive(Default)]
pub struct ServiceRegistry {
    services: DashMap<String, Arc<dyn Service>>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.names())
            .finish()
    }
}

impl ServiceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Register a service, returning the one it replaced.
    pub fn set(
        &self,
        name: impl Into<String>,
        service: Arc<dyn Service>,
    ) -> Option<Arc<dyn Service>> {
        self.services.insert(name.into(), service)
    }

    /// Look up a service by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a service.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Service>> {
        self.services.remove(name).map(|(_, service)| service)
    }

    /// Whether a service is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Point-in-time copy of every registration, sorted by name.
    ///
    /// No registry lock is held once this returns, so callers may invoke
    /// services that touch the registry themselves.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, Arc<dyn Service>)> {
        let mut entries: Vec<(String, Arc<dyn Service>)> = self
            .services
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
