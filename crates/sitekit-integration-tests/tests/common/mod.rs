//! Shared harness for the bootstrap integration tests.

use std::sync::Arc;

use sitekit_kernel::{BootstrapSettings, OrchestratorBuilder, ProcessState, SiteBootstrapOrchestrator};
use sitekit_storage::{PathBuilder, StorageModuleLocator};
use sitekit_test::{MockModuleManagerFactory, MockSecurityProvider, MockSiteRepository};

/// Every collaborator of one orchestrator, kept around for assertions.
pub struct Pipeline {
    /// The orchestrator, already bootstrapped.
    pub orchestrator: SiteBootstrapOrchestrator,
    /// The site repository it resolves against.
    #[allow(dead_code)]
    pub repository: Arc<MockSiteRepository>,
    /// The module manager factory it loads through.
    pub factory: Arc<MockModuleManagerFactory>,
    /// The module locator it filters against.
    #[allow(dead_code)]
    pub locator: Arc<StorageModuleLocator>,
}

impl Pipeline {
    /// Process state shared by every request.
    #[allow(dead_code)]
    pub fn state(&self) -> &Arc<ProcessState> {
        self.orchestrator.state()
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    repository: MockSiteRepository,
    factory: MockModuleManagerFactory,
    modules: Vec<String>,
    settings: BootstrapSettings,
    state: Option<Arc<ProcessState>>,
    extra: Vec<Arc<dyn sitekit_events::PhaseListener>>,
}

impl PipelineBuilder {
    /// Start from the given repository with default settings.
    pub fn new(repository: MockSiteRepository) -> Self {
        sitekit_test::setup_test_logging_default();
        Self {
            repository,
            factory: MockModuleManagerFactory::new(),
            modules: Vec::new(),
            settings: BootstrapSettings::default(),
            state: None,
            extra: Vec::new(),
        }
    }

    /// Use this module manager factory.
    #[allow(dead_code)]
    pub fn factory(mut self, factory: MockModuleManagerFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Make these modules available in storage.
    #[allow(dead_code)]
    pub fn storage_modules(mut self, modules: &[&str]) -> Self {
        self.modules = modules.iter().map(|m| (*m).to_owned()).collect();
        self
    }

    /// Use these settings.
    #[allow(dead_code)]
    pub fn settings(mut self, settings: BootstrapSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Share this process state.
    #[allow(dead_code)]
    pub fn state(mut self, state: Arc<ProcessState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Register an extra listener after the built-in ones.
    #[allow(dead_code)]
    pub fn listener(mut self, listener: Arc<dyn sitekit_events::PhaseListener>) -> Self {
        self.extra.push(listener);
        self
    }

    /// Build and bootstrap the orchestrator.
    pub fn build(self) -> Pipeline {
        let repository = Arc::new(self.repository);
        let factory = Arc::new(self.factory);
        let locator = Arc::new(
            StorageModuleLocator::new(PathBuilder::default(), "/modules")
                .with_modules(&self.modules),
        );

        let mut builder: OrchestratorBuilder = SiteBootstrapOrchestrator::builder()
            .settings(self.settings)
            .site_repository(Arc::clone(&repository) as _)
            .module_locator(Arc::clone(&locator) as _)
            .module_manager_factory(Arc::clone(&factory) as _)
            .security_provider(Arc::new(MockSecurityProvider::new("tenant")));
        if let Some(state) = self.state {
            builder = builder.state(state);
        }
        for listener in self.extra {
            builder = builder.listener(listener);
        }

        let orchestrator = builder.build().expect("pipeline should build");
        orchestrator.bootstrap();

        Pipeline {
            orchestrator,
            repository,
            factory,
            locator,
        }
    }
}
