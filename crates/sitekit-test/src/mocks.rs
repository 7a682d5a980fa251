//! Mock collaborators for testing.
//!
//! All mocks use `std::sync::Mutex` or atomics internally so builder
//! methods work without a runtime.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use sitekit_core::{
    BootstrapResult, BoxError, ModuleManager, ModuleManagerFactory, Phase, SecurityManager,
    SecurityManagerProvider, Service, ServiceRegistry, Site, SiteConfig, SiteKey, SiteRepository,
    WantsModuleManager, WantsSecurityManager,
};
use sitekit_events::{BootstrapEvent, PhaseListener};

fn normalize(host: &str) -> String {
    SiteKey::from_host(host).map_or_else(|| host.to_owned(), |k| k.as_str().to_owned())
}

// ---------------------------------------------------------------------------
// Site repository
// ---------------------------------------------------------------------------

/// In-memory [`SiteRepository`] that counts lookups per host.
#[derive(Debug, Default)]
pub struct MockSiteRepository {
    sites: HashMap<String, Site>,
    configs: HashMap<String, SiteConfig>,
    failing_hosts: HashSet<String>,
    failing_configs: HashSet<String>,
    delay: Option<Duration>,
    resolve_calls: Mutex<HashMap<String, usize>>,
    config_calls: AtomicUsize,
}

impl MockSiteRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `site` for each of its hosts.
    #[must_use]
    pub fn with_site(mut self, site: Site) -> Self {
        for host in &site.hosts {
            self.sites.insert(normalize(host), site.clone());
        }
        self
    }

    /// Return `config` from `site_config` for the site keyed by `host`.
    #[must_use]
    pub fn with_config(mut self, host: &str, config: SiteConfig) -> Self {
        self.configs.insert(normalize(host), config);
        self
    }

    /// Fail lookups of `host` with a backend error.
    #[must_use]
    pub fn failing_host(mut self, host: &str) -> Self {
        self.failing_hosts.insert(normalize(host));
        self
    }

    /// Fail `site_config` for the site keyed by `host`.
    #[must_use]
    pub fn failing_config(mut self, host: &str) -> Self {
        self.failing_configs.insert(normalize(host));
        self
    }

    /// Sleep for `delay` in every lookup.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many times `host` was looked up.
    #[must_use]
    pub fn resolve_calls(&self, host: &str) -> usize {
        self.resolve_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize(host))
            .copied()
            .unwrap_or(0)
    }

    /// Lookups across all hosts.
    #[must_use]
    pub fn total_resolve_calls(&self) -> usize {
        self.resolve_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    /// How many times `site_config` was called.
    #[must_use]
    pub fn config_calls(&self) -> usize {
        self.config_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteRepository for MockSiteRepository {
    async fn resolve_by_host(&self, host: &str) -> Result<Option<Site>, BoxError> {
        let host = normalize(host);
        {
            let mut calls = self
                .resolve_calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let count = calls.entry(host.clone()).or_insert(0);
            *count = count.saturating_add(1);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_hosts.contains(&host) {
            return Err(format!("site backend unavailable for {host}").into());
        }
        Ok(self.sites.get(&host).cloned())
    }

    async fn site_config(&self, site: &Site) -> Result<SiteConfig, BoxError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        let key = site.key.as_str();
        if self.failing_configs.contains(key) {
            return Err(format!("configuration store unavailable for {key}").into());
        }
        Ok(self.configs.get(key).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Module manager
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct ModuleBehaviour {
    failing: HashSet<String>,
    provides: Vec<(String, String, Arc<dyn Service>)>,
    delay: Option<Duration>,
}

impl std::fmt::Debug for ModuleBehaviour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let provides: Vec<(&str, &str)> = self
            .provides
            .iter()
            .map(|(module, service, _)| (module.as_str(), service.as_str()))
            .collect();
        f.debug_struct("ModuleBehaviour")
            .field("failing", &self.failing)
            .field("provides", &provides)
            .field("delay", &self.delay)
            .finish()
    }
}

/// Module manager that records successful loads in a journal.
#[derive(Debug)]
pub struct MockModuleManager {
    names: Vec<String>,
    loaded: Mutex<HashSet<String>>,
    behaviour: Arc<ModuleBehaviour>,
    journal: Arc<Mutex<Vec<String>>>,
}

impl MockModuleManager {
    /// A standalone manager for `names` whose loads always succeed.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            loaded: Mutex::new(HashSet::new()),
            behaviour: Arc::new(ModuleBehaviour::default()),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ModuleManager for MockModuleManager {
    fn module_names(&self) -> Vec<String> {
        self.names.clone()
    }

    async fn load_module(&self, name: &str, services: &ServiceRegistry) -> Result<(), BoxError> {
        if let Some(delay) = self.behaviour.delay {
            tokio::time::sleep(delay).await;
        }
        if self.behaviour.failing.contains(name) {
            return Err(format!("module {name} failed to initialize").into());
        }

        for (module, service_name, service) in &self.behaviour.provides {
            if module == name {
                services.set(service_name.clone(), Arc::clone(service));
            }
        }
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned());
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_owned());
        Ok(())
    }

    fn is_loaded(&self, name: &str) -> bool {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }
}

/// Factory for [`MockModuleManager`]s sharing one load journal.
#[derive(Debug, Default)]
pub struct MockModuleManagerFactory {
    behaviour: Arc<ModuleBehaviour>,
    fail_create: bool,
    journal: Arc<Mutex<Vec<String>>>,
    created: AtomicUsize,
}

impl MockModuleManagerFactory {
    /// Create a factory whose modules all load.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make loading `module` fail.
    #[must_use]
    pub fn failing_module(mut self, module: &str) -> Self {
        Arc::make_mut(&mut self.behaviour).failing.insert(module.to_owned());
        self
    }

    /// Make `create` fail.
    #[must_use]
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Sleep for `delay` in every module load.
    #[must_use]
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        Arc::make_mut(&mut self.behaviour).delay = Some(delay);
        self
    }

    /// Register `service` as `service_name` when `module` loads.
    #[must_use]
    pub fn provides(mut self, module: &str, service_name: &str, service: Arc<dyn Service>) -> Self {
        Arc::make_mut(&mut self.behaviour)
            .provides
            .push((module.to_owned(), service_name.to_owned(), service));
        self
    }

    /// Successful loads across all managers, in order.
    #[must_use]
    pub fn load_journal(&self) -> Vec<String> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Successful loads of `module`.
    #[must_use]
    pub fn load_count(&self, module: &str) -> usize {
        self.load_journal().iter().filter(|m| *m == module).count()
    }

    /// Managers created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModuleManagerFactory for MockModuleManagerFactory {
    async fn create(&self, module_names: &[String]) -> Result<Arc<dyn ModuleManager>, BoxError> {
        if self.fail_create {
            return Err("module manager backend unavailable".into());
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockModuleManager {
            names: module_names.to_vec(),
            loaded: Mutex::new(HashSet::new()),
            behaviour: Arc::clone(&self.behaviour),
            journal: Arc::clone(&self.journal),
        }))
    }
}

// ---------------------------------------------------------------------------
// Security
// ---------------------------------------------------------------------------

/// Security manager identified by its realm.
#[derive(Debug)]
pub struct MockSecurityManager {
    realm: String,
}

impl SecurityManager for MockSecurityManager {
    fn realm(&self) -> &str {
        &self.realm
    }
}

/// Hands out one shared [`MockSecurityManager`].
#[derive(Debug)]
pub struct MockSecurityProvider {
    manager: Arc<MockSecurityManager>,
}

impl MockSecurityProvider {
    /// Provider for a manager in `realm`.
    #[must_use]
    pub fn new(realm: &str) -> Self {
        Self {
            manager: Arc::new(MockSecurityManager {
                realm: realm.to_owned(),
            }),
        }
    }
}

impl SecurityManagerProvider for MockSecurityProvider {
    fn security_manager(&self) -> Arc<dyn SecurityManager> {
        Arc::clone(&self.manager) as Arc<dyn SecurityManager>
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Service that records what was injected into it.
#[derive(Debug)]
pub struct RecordingService {
    aware: bool,
    fail: bool,
    module_injections: AtomicUsize,
    last_modules: Mutex<Option<Vec<String>>>,
    realm: Mutex<Option<String>>,
}

impl Default for RecordingService {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingService {
    /// A service that wants both managers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            aware: true,
            fail: false,
            module_injections: AtomicUsize::new(0),
            last_modules: Mutex::new(None),
            realm: Mutex::new(None),
        }
    }

    /// A service with no injection capabilities.
    #[must_use]
    pub fn unaware() -> Self {
        Self {
            aware: false,
            ..Self::new()
        }
    }

    /// Reject every injection.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Accepted module manager injections.
    #[must_use]
    pub fn module_manager_injections(&self) -> usize {
        self.module_injections.load(Ordering::SeqCst)
    }

    /// Module names of the last injected module manager.
    #[must_use]
    pub fn last_module_names(&self) -> Option<Vec<String>> {
        self.last_modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Realm of the injected security manager.
    #[must_use]
    pub fn security_realm(&self) -> Option<String> {
        self.realm
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl WantsModuleManager for RecordingService {
    fn set_module_manager(&self, manager: Arc<dyn ModuleManager>) -> Result<(), BoxError> {
        if self.fail {
            return Err("service rejected the module manager".into());
        }
        self.module_injections.fetch_add(1, Ordering::SeqCst);
        *self
            .last_modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(manager.module_names());
        Ok(())
    }
}

impl WantsSecurityManager for RecordingService {
    fn set_security_manager(&self, manager: Arc<dyn SecurityManager>) -> Result<(), BoxError> {
        if self.fail {
            return Err("service rejected the security manager".into());
        }
        *self.realm.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(manager.realm().to_owned());
        Ok(())
    }
}

impl Service for RecordingService {
    fn module_manager_aware(&self) -> Option<&dyn WantsModuleManager> {
        self.aware.then_some(self as &dyn WantsModuleManager)
    }

    fn security_manager_aware(&self) -> Option<&dyn WantsSecurityManager> {
        self.aware.then_some(self as &dyn WantsSecurityManager)
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Listener that counts its invocations and can stop propagation or stall.
#[derive(Debug)]
pub struct CountingListener {
    phase: Phase,
    name: String,
    stop: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl CountingListener {
    /// A listener named `counting` bound to `phase`.
    #[must_use]
    pub fn new(phase: Phase) -> Self {
        Self::named(phase, "counting")
    }

    /// A listener with a custom name.
    #[must_use]
    pub fn named(phase: Phase, name: &str) -> Self {
        Self {
            phase,
            name: name.to_owned(),
            stop: false,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stop propagation after running.
    #[must_use]
    pub fn stopping(mut self) -> Self {
        self.stop = true;
        self
    }

    /// Sleep for `delay` before returning.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Invocations so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared handle to the invocation counter.
    #[must_use]
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl PhaseListener for CountingListener {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &mut BootstrapEvent) -> BootstrapResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.stop {
            event.stop_propagation(true);
        }
        Ok(())
    }
}
