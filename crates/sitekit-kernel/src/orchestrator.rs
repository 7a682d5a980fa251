//! The site bootstrap orchestrator.

use std::sync::{Arc, OnceLock};

use sitekit_core::{
    BootstrapError, BootstrapResult, ModuleManager, ModuleManagerFactory, ModuleStorageLocator,
    Phase, RouteContext, SecurityManagerProvider, Service, Site, SiteRepository,
};
use sitekit_events::{BootstrapEvent, EventDispatcher, FireReport, PhaseListener};
use sitekit_telemetry::RequestContext;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, info};
use uuid::Uuid;

use crate::error::{KernelError, KernelResult, PrepareSiteError};
use crate::listeners::{
    CollectModulesListener, InjectModuleManagerListener, InjectSecurityManagerListener,
    LoadModulesListener, SiteConfigListener, SiteModelLoadListener,
};
use crate::resources::ModuleResourceManager;
use crate::settings::BootstrapSettings;
use crate::state::ProcessState;

/// What a successful bootstrap produced for one request.
#[derive(Debug, Clone)]
pub struct PreparedSite {
    /// The resolved site with its merged configuration.
    pub site: Site,
    /// Modules collected for the site, core modules first.
    pub module_names: Vec<String>,
    /// The module manager created for the request.
    pub module_manager: Option<Arc<dyn ModuleManager>>,
    /// Collected modules that are not loaded, because loading failed under
    /// the skip policy.
    pub skipped_modules: Vec<String>,
}

/// Runs the bootstrap phases for each request.
///
/// Call [`bootstrap`](Self::bootstrap) once at startup, then
/// [`prepare_site`](Self::prepare_site) per request. Listeners and the
/// process state are shared by every request.
pub struct SiteBootstrapOrchestrator {
    id: Uuid,
    settings: BootstrapSettings,
    state: Arc<ProcessState>,
    dispatcher: EventDispatcher,
    listeners: Vec<Arc<dyn PhaseListener>>,
    resources: Arc<ModuleResourceManager>,
    registered: OnceLock<usize>,
}

impl std::fmt::Debug for SiteBootstrapOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteBootstrapOrchestrator")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("bootstrapped", &self.is_bootstrapped())
            .finish_non_exhaustive()
    }
}

impl SiteBootstrapOrchestrator {
    /// Start building an orchestrator.
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Id stamped on every event this orchestrator fires.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The settings the orchestrator was built with.
    #[must_use]
    pub fn settings(&self) -> &BootstrapSettings {
        &self.settings
    }

    /// Shared process state.
    #[must_use]
    pub fn state(&self) -> &Arc<ProcessState> {
        &self.state
    }

    /// Resource lookup for loaded modules, built from this orchestrator's
    /// locator and path settings. It is the registered service unless the
    /// caller registered its own under the same name first.
    #[must_use]
    pub fn resource_manager(&self) -> &Arc<ModuleResourceManager> {
        &self.resources
    }

    /// The dispatcher the listeners are registered with.
    #[must_use]
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Register all listeners with the dispatcher.
    ///
    /// Only the first call registers anything; concurrent and repeated calls
    /// wait for it and return.
    pub fn bootstrap(&self) {
        self.registered.get_or_init(|| {
            for listener in &self.listeners {
                self.dispatcher.attach(Arc::clone(listener));
            }
            info!(
                orchestrator = %self.id,
                listeners = self.listeners.len(),
                "Bootstrap listeners registered"
            );
            self.listeners.len()
        });
    }

    /// Whether [`bootstrap`](Self::bootstrap) has run.
    #[must_use]
    pub fn is_bootstrapped(&self) -> bool {
        self.registered.get().is_some()
    }

    /// Run every phase for the request described by `route`.
    ///
    /// # Errors
    ///
    /// Returns [`PrepareSiteError::NotBootstrapped`] before
    /// [`bootstrap`](Self::bootstrap), otherwise the first phase error.
    pub async fn prepare_site(
        &self,
        route: Option<RouteContext>,
    ) -> Result<PreparedSite, PrepareSiteError> {
        self.prepare_site_with_cancel(route, &CancellationToken::new())
            .await
    }

    /// Like [`prepare_site`](Self::prepare_site), aborting with
    /// [`BootstrapError::Cancelled`] once `cancel` fires.
    ///
    /// # Errors
    ///
    /// See [`prepare_site`](Self::prepare_site).
    pub async fn prepare_site_with_cancel(
        &self,
        route: Option<RouteContext>,
        cancel: &CancellationToken,
    ) -> Result<PreparedSite, PrepareSiteError> {
        if !self.is_bootstrapped() {
            return Err(PrepareSiteError::NotBootstrapped);
        }

        let mut ctx = RequestContext::new("prepare_site");
        if let Some(route) = &route {
            if let Some(host) = route.param(&self.settings.route_host_param) {
                ctx = ctx.with_host(host);
            }
            if let Some(name) = route.route_name() {
                ctx = ctx.with_route(name);
            }
        }

        let span = ctx.span();
        self.run_phases(route, cancel, &ctx).instrument(span).await
    }

    async fn run_phases(
        &self,
        route: Option<RouteContext>,
        cancel: &CancellationToken,
        ctx: &RequestContext,
    ) -> Result<PreparedSite, PrepareSiteError> {
        let mut event = BootstrapEvent::new(self.id);
        if let Some(route) = route {
            event = event.with_route(Arc::new(route));
        }

        for phase in Phase::ALL {
            self.run_phase(phase, &mut event, cancel)
                .await
                .map_err(|source| PrepareSiteError::Phase { phase, source })?;

            if phase == Phase::SiteModelLoad && event.site().is_none() {
                return Err(PrepareSiteError::Phase {
                    phase,
                    source: BootstrapError::MissingSite { phase },
                });
            }
        }

        let (site, module_names, module_manager) = event.into_parts();
        let site = site.ok_or(PrepareSiteError::Phase {
            phase: Phase::LoadModulesPost,
            source: BootstrapError::MissingSite {
                phase: Phase::LoadModulesPost,
            },
        })?;
        let ledger = self.state.modules();
        let skipped_modules: Vec<String> = module_names
            .iter()
            .filter(|name| !ledger.is_loaded(name))
            .cloned()
            .collect();

        info!(
            site = %site.key,
            modules = module_names.len(),
            skipped = skipped_modules.len(),
            elapsed_ms = ctx.elapsed_ms(),
            "Site prepared"
        );

        Ok(PreparedSite {
            site,
            module_names,
            module_manager,
            skipped_modules,
        })
    }

    /// Fire one phase, racing it against cancellation and the phase timeout.
    async fn run_phase(
        &self,
        phase: Phase,
        event: &mut BootstrapEvent,
        cancel: &CancellationToken,
    ) -> BootstrapResult<FireReport> {
        if cancel.is_cancelled() {
            return Err(BootstrapError::Cancelled { phase });
        }

        let fire = self
            .dispatcher
            .fire(phase, event)
            .instrument(debug_span!("phase", phase = %phase));
        let bounded = async {
            match self.settings.phase_timeout {
                Some(limit) => match tokio::time::timeout(limit, fire).await {
                    Ok(result) => result,
                    Err(_) => Err(BootstrapError::TimedOut {
                        phase,
                        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    }),
                },
                None => fire.await,
            }
        };

        let report = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(BootstrapError::Cancelled { phase }),
            result = bounded => result,
        }?;

        debug!(
            phase = %phase,
            invoked = report.invoked,
            skipped = report.skipped,
            "Phase complete"
        );
        Ok(report)
    }
}

/// Builder for [`SiteBootstrapOrchestrator`].
#[derive(Default)]
pub struct OrchestratorBuilder {
    settings: BootstrapSettings,
    state: Option<Arc<ProcessState>>,
    repository: Option<Arc<dyn SiteRepository>>,
    locator: Option<Arc<dyn ModuleStorageLocator>>,
    factory: Option<Arc<dyn ModuleManagerFactory>>,
    security: Option<Arc<dyn SecurityManagerProvider>>,
    extra_listeners: Vec<Arc<dyn PhaseListener>>,
}

impl OrchestratorBuilder {
    /// Use these settings.
    #[must_use]
    pub fn settings(mut self, settings: BootstrapSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Share existing process state. A fresh one is created otherwise.
    #[must_use]
    pub fn state(mut self, state: Arc<ProcessState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Where sites and their configuration come from.
    #[must_use]
    pub fn site_repository(mut self, repository: Arc<dyn SiteRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Which modules exist in storage.
    #[must_use]
    pub fn module_locator(mut self, locator: Arc<dyn ModuleStorageLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Creates a module manager per request.
    #[must_use]
    pub fn module_manager_factory(mut self, factory: Arc<dyn ModuleManagerFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Supplies the security manager injected after loading.
    #[must_use]
    pub fn security_provider(mut self, provider: Arc<dyn SecurityManagerProvider>) -> Self {
        self.security = Some(provider);
        self
    }

    /// Register an extra listener after the built-in ones.
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn PhaseListener>) -> Self {
        self.extra_listeners.push(listener);
        self
    }

    /// Build the orchestrator. Listeners are created here and registered by
    /// [`SiteBootstrapOrchestrator::bootstrap`].
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::MissingCollaborator`] if a collaborator was not
    /// supplied, or [`KernelError::InvalidSetting`] for unusable settings.
    pub fn build(self) -> KernelResult<SiteBootstrapOrchestrator> {
        let repository = self
            .repository
            .ok_or(KernelError::MissingCollaborator("site repository"))?;
        let locator = self
            .locator
            .ok_or(KernelError::MissingCollaborator("module storage locator"))?;
        let factory = self
            .factory
            .ok_or(KernelError::MissingCollaborator("module manager factory"))?;
        let security = self
            .security
            .ok_or(KernelError::MissingCollaborator("security manager provider"))?;
        self.settings.validate()?;

        let state = self.state.unwrap_or_default();
        let settings = self.settings;

        let resources = Arc::new(ModuleResourceManager::new(
            Arc::clone(&locator),
            settings.paths,
            state.module_ledger(),
        ));
        if state.services().contains(ModuleResourceManager::SERVICE_NAME) {
            debug!("Module resource manager already registered, keeping it");
        } else {
            state.services().set(
                ModuleResourceManager::SERVICE_NAME,
                Arc::clone(&resources) as Arc<dyn Service>,
            );
        }

        let mut listeners: Vec<Arc<dyn PhaseListener>> = vec![
            Arc::new(SiteModelLoadListener::new(
                Arc::clone(&repository),
                Arc::clone(&state),
                settings.route_host_param.clone(),
            )),
            Arc::new(SiteConfigListener::new(
                repository,
                settings.site_defaults.clone(),
            )),
            Arc::new(CollectModulesListener::new(
                settings.core_modules.clone(),
                locator,
            )),
            Arc::new(LoadModulesListener::new(
                factory,
                Arc::clone(&state),
                settings.failure_policy,
            )),
            Arc::new(InjectModuleManagerListener::new(Arc::clone(&state))),
            Arc::new(InjectSecurityManagerListener::new(
                Arc::clone(&state),
                security,
            )),
        ];
        listeners.extend(self.extra_listeners);

        Ok(SiteBootstrapOrchestrator {
            id: Uuid::new_v4(),
            settings,
            state,
            dispatcher: EventDispatcher::new(),
            listeners,
            resources,
            registered: OnceLock::new(),
        })
    }
}
