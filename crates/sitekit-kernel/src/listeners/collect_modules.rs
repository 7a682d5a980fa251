use std::sync::Arc;

use async_trait::async_trait;
use sitekit_core::{BootstrapError, BootstrapResult, ModuleStorageLocator, Phase};
use sitekit_events::{BootstrapEvent, PhaseListener};
use tracing::{debug, warn};

/// Builds the request's module list: core modules first, then the site's
/// own modules.
///
/// Site modules missing from storage are dropped. Core modules are never
/// filtered.
pub struct CollectModulesListener {
    core_modules: Vec<String>,
    locator: Arc<dyn ModuleStorageLocator>,
}

impl CollectModulesListener {
    /// Create the listener.
    pub fn new(core_modules: Vec<String>, locator: Arc<dyn ModuleStorageLocator>) -> Self {
        Self {
            core_modules,
            locator,
        }
    }
}

#[async_trait]
impl PhaseListener for CollectModulesListener {
    fn phase(&self) -> Phase {
        Phase::CollectModules
    }

    fn name(&self) -> &str {
        "collect_modules"
    }

    async fn handle(&self, event: &mut BootstrapEvent) -> BootstrapResult<()> {
        let site = event.site().ok_or(BootstrapError::MissingSite {
            phase: Phase::CollectModules,
        })?;
        let declared = site.declared_modules()?;

        let mut names = self.core_modules.clone();
        for module in declared {
            if self.core_modules.contains(&module) {
                continue;
            }
            if !self.locator.contains(&module) {
                warn!(
                    site = %site.key,
                    module = %module,
                    "Declared module not found in storage, ignoring"
                );
                continue;
            }
            names.push(module);
        }

        event.set_module_names(names)?;
        debug!(modules = ?event.module_names(), "Modules collected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_core::Site;
    use sitekit_storage::{PathBuilder, StorageModuleLocator};
    use sitekit_test::test_site;
    use uuid::Uuid;

    fn locator(modules: &[&str]) -> Arc<dyn ModuleStorageLocator> {
        Arc::new(
            StorageModuleLocator::new(PathBuilder::default(), "/modules").with_modules(modules),
        )
    }

    fn event_with(site: Site) -> BootstrapEvent {
        let mut event = BootstrapEvent::new(Uuid::new_v4());
        event.set_site(site).unwrap();
        event.enter_phase(Phase::CollectModules);
        event
    }

    #[tokio::test]
    async fn test_core_first_without_duplicates() {
        let listener = CollectModulesListener::new(
            vec!["core-a".to_owned(), "core-b".to_owned()],
            locator(&["ext-x"]),
        );
        let mut event = event_with(test_site("example.com").with_modules(["core-a", "ext-x"]));

        listener.handle(&mut event).await.unwrap();
        assert_eq!(event.module_names(), ["core-a", "core-b", "ext-x"]);
    }

    #[tokio::test]
    async fn test_unknown_site_modules_are_dropped() {
        let listener = CollectModulesListener::new(vec!["core-a".to_owned()], locator(&["blog"]));
        let mut event = event_with(
            test_site("example.com").with_modules(["missing", "blog", "blog"]),
        );

        listener.handle(&mut event).await.unwrap();
        assert_eq!(event.module_names(), ["core-a", "blog"]);
    }

    #[tokio::test]
    async fn test_invalid_module_list() {
        let listener = CollectModulesListener::new(Vec::new(), locator(&[]));
        let site = test_site("example.com").with_config("modules", serde_json::json!("blog"));
        let mut event = event_with(site);

        assert!(matches!(
            listener.handle(&mut event).await,
            Err(BootstrapError::InvalidModuleList { .. })
        ));
    }
}
