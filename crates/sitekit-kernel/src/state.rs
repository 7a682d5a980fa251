//! Process-wide state shared by concurrent bootstraps.
//!
//! Both caches hand out one `OnceCell` per key. The first caller runs the
//! initializer while later callers wait on the same cell, so a site is
//! resolved and a module loaded at most once. A failed or dropped
//! initializer leaves the cell empty and the next caller retries.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use sitekit_core::{BootstrapResult, BoxError, ServiceRegistry, Site, SiteKey};
use tokio::sync::OnceCell;

/// Sites resolved so far, keyed by normalized host.
#[derive(Debug, Default)]
pub struct SiteCache {
    cells: DashMap<SiteKey, Arc<OnceCell<Site>>>,
}

impl SiteCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached site for `key`, running `resolve` if none is cached.
    ///
    /// Concurrent callers for the same key share one `resolve` call.
    ///
    /// # Errors
    ///
    /// Returns the error from `resolve`; nothing is cached in that case.
    pub async fn get_or_resolve<F, Fut>(&self, key: &SiteKey, resolve: F) -> BootstrapResult<Site>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = BootstrapResult<Site>>,
    {
        let cell = Arc::clone(self.cells.entry(key.clone()).or_default().value());

        match cell.get_or_try_init(resolve).await {
            Ok(site) => Ok(site.clone()),
            Err(e) => {
                self.cells
                    .remove_if(key, |_, c| Arc::ptr_eq(c, &cell) && !c.initialized());
                Err(e)
            },
        }
    }

    /// The cached site for `key`, if resolved.
    #[must_use]
    pub fn get(&self, key: &SiteKey) -> Option<Site> {
        self.cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Drop the cached site for `key`. Returns `true` if one was cached.
    pub fn invalidate(&self, key: &SiteKey) -> bool {
        self.cells
            .remove(key)
            .is_some_and(|(_, cell)| cell.initialized())
    }

    /// Number of resolved sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|e| e.value().initialized()).count()
    }

    /// Whether no site has been resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of asking the ledger to load a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This call loaded the module.
    Loaded,
    /// The module was already loaded in this process.
    AlreadyLoaded,
}

/// Modules loaded in this process.
#[derive(Debug, Default)]
pub struct ModuleLedger {
    cells: DashMap<String, Arc<OnceCell<()>>>,
}

impl ModuleLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `load` unless `name` is already loaded.
    ///
    /// # Errors
    ///
    /// Returns the error from `load`; the module stays unloaded.
    pub async fn load_once<F, Fut>(&self, name: &str, load: F) -> Result<LoadOutcome, BoxError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), BoxError>>,
    {
        let cell = Arc::clone(self.cells.entry(name.to_owned()).or_default().value());

        let mut ran = false;
        cell.get_or_try_init(|| {
            ran = true;
            load()
        })
        .await?;

        Ok(if ran {
            LoadOutcome::Loaded
        } else {
            LoadOutcome::AlreadyLoaded
        })
    }

    /// Whether `name` has been loaded.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.cells.get(name).is_some_and(|cell| cell.initialized())
    }

    /// Loaded module names, sorted.
    #[must_use]
    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .cells
            .iter()
            .filter(|e| e.value().initialized())
            .map(|e| e.key().clone())
            .collect();
        names.sort();
        names
    }
}

/// State shared by every bootstrap in the process.
#[derive(Debug, Default)]
pub struct ProcessState {
    sites: SiteCache,
    services: Arc<ServiceRegistry>,
    modules: Arc<ModuleLedger>,
}

impl ProcessState {
    /// Fresh state with an empty service registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh caches around an existing service registry.
    #[must_use]
    pub fn with_services(services: Arc<ServiceRegistry>) -> Self {
        Self {
            services,
            ..Self::default()
        }
    }

    /// Per-host site cache.
    #[must_use]
    pub fn sites(&self) -> &SiteCache {
        &self.sites
    }

    /// Process-wide service registry.
    #[must_use]
    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    /// Module load ledger.
    #[must_use]
    pub fn modules(&self) -> &ModuleLedger {
        &self.modules
    }

    /// Shared handle to the module load ledger.
    #[must_use]
    pub fn module_ledger(&self) -> Arc<ModuleLedger> {
        Arc::clone(&self.modules)
    }
}
