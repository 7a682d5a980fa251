use std::sync::Arc;

use async_trait::async_trait;
use sitekit_core::{BootstrapError, BootstrapResult, Phase, SecurityManagerProvider};
use sitekit_events::{BootstrapEvent, PhaseListener};
use tracing::{debug, warn};

use crate::state::ProcessState;

fn report_failure(service: String, source: sitekit_core::BoxError) {
    let err = BootstrapError::Injection { service, source };
    warn!(error = %err, "Injection failed, continuing");
}

/// Hands the request's module manager to every service that wants it.
pub struct InjectModuleManagerListener {
    state: Arc<ProcessState>,
}

impl InjectModuleManagerListener {
    /// Create the listener.
    pub fn new(state: Arc<ProcessState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl PhaseListener for InjectModuleManagerListener {
    fn phase(&self) -> Phase {
        Phase::LoadModulesPost
    }

    fn name(&self) -> &str {
        "inject_module_manager"
    }

    async fn handle(&self, event: &mut BootstrapEvent) -> BootstrapResult<()> {
        let Some(manager) = event.module_manager() else {
            debug!("No module manager on the event, nothing to inject");
            return Ok(());
        };

        let mut injected: usize = 0;
        for (name, service) in self.state.services().snapshot() {
            let Some(target) = service.module_manager_aware() else {
                continue;
            };
            match target.set_module_manager(Arc::clone(manager)) {
                Ok(()) => injected = injected.saturating_add(1),
                Err(source) => report_failure(name, source),
            }
        }

        debug!(injected, "Module manager injected");
        Ok(())
    }
}

/// Hands the security manager to every service that wants it.
pub struct InjectSecurityManagerListener {
    state: Arc<ProcessState>,
    provider: Arc<dyn SecurityManagerProvider>,
}

impl InjectSecurityManagerListener {
    /// Create the listener.
    pub fn new(state: Arc<ProcessState>, provider: Arc<dyn SecurityManagerProvider>) -> Self {
        Self { state, provider }
    }
}

#[async_trait]
impl PhaseListener for InjectSecurityManagerListener {
    fn phase(&self) -> Phase {
        Phase::LoadModulesPost
    }

    fn name(&self) -> &str {
        "inject_security_manager"
    }

    async fn handle(&self, _event: &mut BootstrapEvent) -> BootstrapResult<()> {
        let manager = self.provider.security_manager();

        let mut injected: usize = 0;
        for (name, service) in self.state.services().snapshot() {
            let Some(target) = service.security_manager_aware() else {
                continue;
            };
            match target.set_security_manager(Arc::clone(&manager)) {
                Ok(()) => injected = injected.saturating_add(1),
                Err(source) => report_failure(name, source),
            }
        }

        debug!(injected, realm = manager.realm(), "Security manager injected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_core::{ModuleManager, Service};
    use sitekit_test::{MockModuleManager, MockSecurityProvider, RecordingService};
    use uuid::Uuid;

    fn event_with_manager() -> BootstrapEvent {
        let mut event = BootstrapEvent::new(Uuid::new_v4());
        event.enter_phase(Phase::LoadModules);
        let manager: Arc<dyn ModuleManager> = Arc::new(MockModuleManager::new(["blog"]));
        event.set_module_manager(manager).unwrap();
        event.enter_phase(Phase::LoadModulesPost);
        event
    }

    #[tokio::test]
    async fn test_module_manager_reaches_aware_services_only() {
        let state = Arc::new(ProcessState::new());
        let aware = Arc::new(RecordingService::new());
        state
            .services()
            .set("aware", Arc::clone(&aware) as Arc<dyn Service>);
        state
            .services()
            .set("plain", Arc::new(RecordingService::unaware()) as Arc<dyn Service>);

        let listener = InjectModuleManagerListener::new(Arc::clone(&state));
        let mut event = event_with_manager();
        listener.handle(&mut event).await.unwrap();

        assert_eq!(aware.module_manager_injections(), 1);
        assert_eq!(aware.last_module_names(), Some(vec!["blog".to_owned()]));
    }

    #[tokio::test]
    async fn test_injection_failure_is_not_fatal() {
        let state = Arc::new(ProcessState::new());
        let failing = Arc::new(RecordingService::new().failing());
        let healthy = Arc::new(RecordingService::new());
        state
            .services()
            .set("a-failing", Arc::clone(&failing) as Arc<dyn Service>);
        state
            .services()
            .set("b-healthy", Arc::clone(&healthy) as Arc<dyn Service>);

        let mut event = event_with_manager();
        InjectModuleManagerListener::new(Arc::clone(&state))
            .handle(&mut event)
            .await
            .unwrap();
        InjectSecurityManagerListener::new(
            Arc::clone(&state),
            Arc::new(MockSecurityProvider::new("tenant")),
        )
        .handle(&mut event)
        .await
        .unwrap();

        assert_eq!(healthy.module_manager_injections(), 1);
        assert_eq!(healthy.security_realm().as_deref(), Some("tenant"));
        assert!(failing.security_realm().is_none());
    }

    #[tokio::test]
    async fn test_without_module_manager() {
        let state = Arc::new(ProcessState::new());
        let aware = Arc::new(RecordingService::new());
        state
            .services()
            .set("aware", Arc::clone(&aware) as Arc<dyn Service>);

        let mut event = BootstrapEvent::new(Uuid::new_v4());
        event.enter_phase(Phase::LoadModulesPost);
        InjectModuleManagerListener::new(state)
            .handle(&mut event)
            .await
            .unwrap();
        assert_eq!(aware.module_manager_injections(), 0);
    }
}
