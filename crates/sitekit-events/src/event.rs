//! The per-request bootstrap event.

use std::collections::HashSet;
use std::sync::Arc;

use sitekit_core::{BootstrapError, BootstrapResult, ModuleManager, Phase, RouteContext, Site};
use uuid::Uuid;

/// Mutable context threaded through every bootstrap phase of one request.
///
/// Each field is owned by one phase: it may only be written while that phase
/// is being fired and is read-only afterwards. Writes outside the owning
/// phase fail with [`BootstrapError::PhaseViolation`].
///
/// | field            | written in                     |
/// |------------------|--------------------------------|
/// | `site`           | `SiteModelLoad` (set), `Config` (mutate) |
/// | `module_names`   | `CollectModules`               |
/// | `module_manager` | `LoadModules`                  |
#[derive(Debug)]
pub struct BootstrapEvent {
    target: Uuid,
    route: Option<Arc<RouteContext>>,
    site: Option<Site>,
    module_names: Vec<String>,
    module_manager: Option<Arc<dyn ModuleManager>>,
    phase: Phase,
    stopped: bool,
}

impl BootstrapEvent {
    /// Create an event for the orchestrator identified by `target`.
    ///
    /// The event starts positioned at the first phase.
    #[must_use]
    pub fn new(target: Uuid) -> Self {
        Self {
            target,
            route: None,
            site: None,
            module_names: Vec::new(),
            module_manager: None,
            phase: Phase::SiteModelLoad,
            stopped: false,
        }
    }

    /// Attach the request's route snapshot.
    #[must_use]
    pub fn with_route(mut self, route: Arc<RouteContext>) -> Self {
        self.route = Some(route);
        self
    }

    /// Id of the orchestrator running this bootstrap.
    #[must_use]
    pub fn target(&self) -> Uuid {
        self.target
    }

    /// Route snapshot, absent for bootstraps not triggered by a request.
    #[must_use]
    pub fn route(&self) -> Option<&RouteContext> {
        self.route.as_deref()
    }

    /// The resolved site, once the first phase has run.
    #[must_use]
    pub fn site(&self) -> Option<&Site> {
        self.site.as_ref()
    }

    /// Collected module names: core modules first, no duplicates.
    #[must_use]
    pub fn module_names(&self) -> &[String] {
        &self.module_names
    }

    /// Module manager created while loading modules.
    #[must_use]
    pub fn module_manager(&self) -> Option<&Arc<dyn ModuleManager>> {
        self.module_manager.as_ref()
    }

    /// The phase currently (or most recently) fired.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Set or clear the stop flag for the current phase.
    pub fn stop_propagation(&mut self, stop: bool) {
        self.stopped = stop;
    }

    /// Whether a listener stopped the current phase.
    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }

    /// Position the event at `phase` and clear the stop flag.
    ///
    /// Called by the dispatcher before a phase's listeners run.
    pub fn enter_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.stopped = false;
    }

    /// Store the resolved site.
    ///
    /// # Errors
    ///
    /// Fails outside [`Phase::SiteModelLoad`].
    pub fn set_site(&mut self, site: Site) -> BootstrapResult<()> {
        self.require_phase("site", &[Phase::SiteModelLoad])?;
        self.site = Some(site);
        Ok(())
    }

    /// Mutable access to the resolved site.
    ///
    /// # Errors
    ///
    /// Fails after [`Phase::Config`], or with
    /// [`BootstrapError::MissingSite`] when no site has been set.
    pub fn site_mut(&mut self) -> BootstrapResult<&mut Site> {
        self.require_phase("site", &[Phase::SiteModelLoad, Phase::Config])?;
        let phase = self.phase;
        self.site
            .as_mut()
            .ok_or(BootstrapError::MissingSite { phase })
    }

    /// Replace the module list, dropping duplicates and keeping first
    /// occurrences in order.
    ///
    /// # Errors
    ///
    /// Fails outside [`Phase::CollectModules`].
    pub fn set_module_names<I, S>(&mut self, names: I) -> BootstrapResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_phase("module_names", &[Phase::CollectModules])?;
        let mut seen = HashSet::new();
        self.module_names = names
            .into_iter()
            .map(Into::into)
            .filter(|name: &String| seen.insert(name.clone()))
            .collect();
        Ok(())
    }

    /// Store the module manager.
    ///
    /// # Errors
    ///
    /// Fails outside [`Phase::LoadModules`].
    pub fn set_module_manager(&mut self, manager: Arc<dyn ModuleManager>) -> BootstrapResult<()> {
        self.require_phase("module_manager", &[Phase::LoadModules])?;
        self.module_manager = Some(manager);
        Ok(())
    }

    /// Consume the event, yielding the site, the module list and the module
    /// manager.
    #[must_use]
    pub fn into_parts(self) -> (Option<Site>, Vec<String>, Option<Arc<dyn ModuleManager>>) {
        (self.site, self.module_names, self.module_manager)
    }

    fn require_phase(&self, field: &'static str, allowed: &[Phase]) -> BootstrapResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(BootstrapError::PhaseViolation {
                field,
                phase: self.phase,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_core::SiteKey;

    fn site() -> Site {
        Site::new(SiteKey::from_host("example.com").unwrap(), "Example")
    }

    #[test]
    fn test_new_event() {
        let target = Uuid::new_v4();
        let route = RouteContext::builder().param("host", "example.com").build();
        let event = BootstrapEvent::new(target).with_route(Arc::new(route));

        assert_eq!(event.target(), target);
        assert_eq!(event.phase(), Phase::SiteModelLoad);
        assert_eq!(event.route().unwrap().param("host"), Some("example.com"));
        assert!(event.site().is_none());
        assert!(!event.is_propagation_stopped());
    }

    #[test]
    fn test_enter_phase_clears_stop() {
        let mut event = BootstrapEvent::new(Uuid::new_v4());
        event.stop_propagation(true);
        event.enter_phase(Phase::Config);
        assert!(!event.is_propagation_stopped());
        assert_eq!(event.phase(), Phase::Config);
    }

    #[test]
    fn test_site_is_frozen_after_config() {
        let mut event = BootstrapEvent::new(Uuid::new_v4());
        event.set_site(site()).unwrap();

        event.enter_phase(Phase::Config);
        event.site_mut().unwrap().name = "Renamed".to_string();
        assert!(matches!(
            event.set_site(site()),
            Err(BootstrapError::PhaseViolation { field: "site", phase: Phase::Config })
        ));

        event.enter_phase(Phase::CollectModules);
        assert!(event.site_mut().is_err());
        assert_eq!(event.site().unwrap().name, "Renamed");
    }

    #[test]
    fn test_site_mut_without_site() {
        let mut event = BootstrapEvent::new(Uuid::new_v4());
        event.enter_phase(Phase::Config);
        assert!(matches!(
            event.site_mut(),
            Err(BootstrapError::MissingSite { phase: Phase::Config })
        ));
    }

    #[test]
    fn test_module_names_are_deduplicated() {
        let mut event = BootstrapEvent::new(Uuid::new_v4());
        event.enter_phase(Phase::CollectModules);
        event
            .set_module_names(["core-a", "core-b", "core-a", "ext-x", "core-b"])
            .unwrap();
        assert_eq!(event.module_names(), ["core-a", "core-b", "ext-x"]);
    }

    #[test]
    fn test_module_names_scoped_to_collect_phase() {
        let mut event = BootstrapEvent::new(Uuid::new_v4());
        event.enter_phase(Phase::LoadModules);
        assert!(matches!(
            event.set_module_names(["a"]),
            Err(BootstrapError::PhaseViolation { field: "module_names", .. })
        ));
    }
}
