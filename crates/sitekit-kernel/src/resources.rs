//! Module resource lookup.

use std::sync::{Arc, PoisonError, RwLock};

use sitekit_core::{
    BoxError, ModuleManager, ModuleStorageLocator, Service, WantsModuleManager,
};
use sitekit_storage::PathBuilder;
use tracing::trace;

use crate::state::ModuleLedger;

/// Directory inside a module that holds its resources.
const RESOURCES_DIR: &str = "resources";

/// Resolves storage paths of module resources.
///
/// One instance serves every site in the process. Lookups are checked
/// against the process module ledger, so any module loaded by any request
/// can be resolved and no request narrows what another one sees.
///
/// The orchestrator registers one under [`SERVICE_NAME`](Self::SERVICE_NAME)
/// when it is built; it still receives each request's module manager during
/// injection.
pub struct ModuleResourceManager {
    locator: Arc<dyn ModuleStorageLocator>,
    paths: PathBuilder,
    ledger: Arc<ModuleLedger>,
    manager: RwLock<Option<Arc<dyn ModuleManager>>>,
}

impl ModuleResourceManager {
    /// Name the service is registered under.
    pub const SERVICE_NAME: &'static str = "module_resource_manager";

    /// Create a manager resolving modules recorded in `ledger`.
    #[must_use]
    pub fn new(
        locator: Arc<dyn ModuleStorageLocator>,
        paths: PathBuilder,
        ledger: Arc<ModuleLedger>,
    ) -> Self {
        Self {
            locator,
            paths,
            ledger,
            manager: RwLock::new(None),
        }
    }

    /// The most recently injected module manager.
    #[must_use]
    pub fn module_manager(&self) -> Option<Arc<dyn ModuleManager>> {
        self.manager
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Storage path of `resource` inside `module`, i.e.
    /// `<module path>/resources/<resource>`.
    ///
    /// `None` if the module has not been loaded in this process or storage
    /// does not know it.
    #[must_use]
    pub fn resource_path(&self, module: &str, resource: &str) -> Option<String> {
        let module = module.trim();
        if !self.ledger.is_loaded(module) {
            trace!(module = %module, "Resource requested for a module that is not loaded");
            return None;
        }
        let base = self.locator.locate(module)?;
        Some(self.paths.build(
            [base.as_str(), RESOURCES_DIR, resource],
            self.paths.is_absolute(&base),
        ))
    }
}

impl std::fmt::Debug for ModuleResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleResourceManager")
            .field("paths", &self.paths)
            .field("loaded", &self.ledger.loaded())
            .field("has_manager", &self.module_manager().is_some())
            .finish_non_exhaustive()
    }
}

impl WantsModuleManager for ModuleResourceManager {
    fn set_module_manager(&self, manager: Arc<dyn ModuleManager>) -> Result<(), BoxError> {
        *self
            .manager
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(manager);
        Ok(())
    }
}

impl Service for ModuleResourceManager {
    fn module_manager_aware(&self) -> Option<&dyn WantsModuleManager> {
        Some(self)
    }
}
