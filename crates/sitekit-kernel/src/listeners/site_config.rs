use std::sync::Arc;

use async_trait::async_trait;
use sitekit_core::{BootstrapError, BootstrapResult, Phase, SiteConfig, SiteRepository};
use sitekit_events::{BootstrapEvent, PhaseListener};
use tracing::debug;

use crate::merge::merge_layers;

/// Loads the site's configuration and merges it over the defaults.
///
/// Precedence, lowest first: process-wide site defaults, the config carried
/// by the site model, the config fetched from the repository.
pub struct SiteConfigListener {
    repository: Arc<dyn SiteRepository>,
    site_defaults: SiteConfig,
}

impl SiteConfigListener {
    /// Create the listener.
    pub fn new(repository: Arc<dyn SiteRepository>, site_defaults: SiteConfig) -> Self {
        Self {
            repository,
            site_defaults,
        }
    }
}

#[async_trait]
impl PhaseListener for SiteConfigListener {
    fn phase(&self) -> Phase {
        Phase::Config
    }

    fn name(&self) -> &str {
        "site_config"
    }

    async fn handle(&self, event: &mut BootstrapEvent) -> BootstrapResult<()> {
        let site = event
            .site()
            .ok_or(BootstrapError::MissingSite { phase: Phase::Config })?;
        let fetched = self
            .repository
            .site_config(site)
            .await
            .map_err(|source| BootstrapError::ConfigLoad {
                site: site.key.clone(),
                source,
            })?;

        let site = event.site_mut()?;
        site.config = merge_layers([&self.site_defaults, &site.config, &fetched]);
        debug!(site = %site.key, keys = site.config.len(), "Site configuration merged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sitekit_test::{MockSiteRepository, test_site};
    use uuid::Uuid;

    fn defaults() -> SiteConfig {
        let mut defaults = SiteConfig::new();
        defaults.insert("theme".to_owned(), json!("classic"));
        defaults.insert("cache".to_owned(), json!({"ttl": 60, "enabled": true}));
        defaults
    }

    fn event_with_site() -> BootstrapEvent {
        let mut event = BootstrapEvent::new(Uuid::new_v4());
        let site = test_site("example.com").with_config("theme", json!("dark"));
        event.set_site(site).unwrap();
        event.enter_phase(Phase::Config);
        event
    }

    #[tokio::test]
    async fn test_layers_merge_in_order() {
        let mut fetched = SiteConfig::new();
        fetched.insert("cache".to_owned(), json!({"ttl": 5}));
        fetched.insert("modules".to_owned(), json!(["gallery"]));
        let repo = MockSiteRepository::new().with_config("example.com", fetched);
        let listener = SiteConfigListener::new(Arc::new(repo), defaults());

        let mut event = event_with_site();
        listener.handle(&mut event).await.unwrap();

        let config = &event.site().unwrap().config;
        assert_eq!(config["theme"], "dark");
        assert_eq!(config["cache"], json!({"ttl": 5, "enabled": true}));
        assert_eq!(event.site().unwrap().declared_modules().unwrap(), vec!["gallery"]);
    }

    #[tokio::test]
    async fn test_config_failure() {
        let repo = MockSiteRepository::new().failing_config("example.com");
        let listener = SiteConfigListener::new(Arc::new(repo), SiteConfig::new());

        let mut event = event_with_site();
        let err = listener.handle(&mut event).await.unwrap_err();
        assert!(matches!(err, BootstrapError::ConfigLoad { ref site, .. } if site.as_str() == "example.com"));
    }

    #[tokio::test]
    async fn test_without_site() {
        let listener = SiteConfigListener::new(Arc::new(MockSiteRepository::new()), SiteConfig::new());
        let mut event = BootstrapEvent::new(Uuid::new_v4());
        event.enter_phase(Phase::Config);
        assert!(matches!(
            listener.handle(&mut event).await,
            Err(BootstrapError::MissingSite { phase: Phase::Config })
        ));
    }
}
