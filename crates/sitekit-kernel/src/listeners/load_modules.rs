use std::sync::Arc;

use async_trait::async_trait;
use sitekit_config::FailurePolicy;
use sitekit_core::{BootstrapError, BootstrapResult, ModuleManager, ModuleManagerFactory, Phase};
use sitekit_events::{BootstrapEvent, PhaseListener};
use tracing::{debug, info, warn};

use crate::state::{LoadOutcome, ProcessState};

/// Creates the module manager and loads every collected module.
///
/// Loads go through the process ledger, so a module already loaded by an
/// earlier request is not loaded again.
pub struct LoadModulesListener {
    factory: Arc<dyn ModuleManagerFactory>,
    state: Arc<ProcessState>,
    policy: FailurePolicy,
}

impl LoadModulesListener {
    /// Create the listener.
    pub fn new(
        factory: Arc<dyn ModuleManagerFactory>,
        state: Arc<ProcessState>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            factory,
            state,
            policy,
        }
    }
}

#[async_trait]
impl PhaseListener for LoadModulesListener {
    fn phase(&self) -> Phase {
        Phase::LoadModules
    }

    fn name(&self) -> &str {
        "load_modules"
    }

    async fn handle(&self, event: &mut BootstrapEvent) -> BootstrapResult<()> {
        let names = event.module_names().to_vec();
        let manager = self
            .factory
            .create(&names)
            .await
            .map_err(|source| BootstrapError::ModuleManagerInit { source })?;

        let loader: &dyn ModuleManager = manager.as_ref();
        let services = self.state.services().as_ref();
        let mut loaded: usize = 0;

        for name in &names {
            let result = self
                .state
                .modules()
                .load_once(name, move || loader.load_module(name, services))
                .await;

            match result {
                Ok(LoadOutcome::Loaded) => {
                    loaded = loaded.saturating_add(1);
                    debug!(module = %name, "Module loaded");
                },
                Ok(LoadOutcome::AlreadyLoaded) => {
                    debug!(module = %name, "Module already loaded in this process");
                },
                Err(source) => match self.policy {
                    FailurePolicy::Abort => {
                        return Err(BootstrapError::ModuleLoad {
                            module: name.clone(),
                            source,
                        });
                    },
                    FailurePolicy::Skip => {
                        warn!(module = %name, error = %source, "Module failed to load, skipping");
                    },
                },
            }
        }

        info!(requested = names.len(), loaded, "Modules ready");
        event.set_module_manager(manager)
    }
}
