use std::sync::Arc;

use async_trait::async_trait;
use sitekit_core::{BootstrapError, BootstrapResult, Phase, SiteKey, SiteRepository};
use sitekit_events::{BootstrapEvent, PhaseListener};
use tracing::debug;

use crate::state::ProcessState;

/// Resolves the request's site from its host, through the process cache.
pub struct SiteModelLoadListener {
    repository: Arc<dyn SiteRepository>,
    state: Arc<ProcessState>,
    host_param: String,
}

impl SiteModelLoadListener {
    /// Read the host from route parameter `host_param`.
    pub fn new(
        repository: Arc<dyn SiteRepository>,
        state: Arc<ProcessState>,
        host_param: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            state,
            host_param: host_param.into(),
        }
    }
}

#[async_trait]
impl PhaseListener for SiteModelLoadListener {
    fn phase(&self) -> Phase {
        Phase::SiteModelLoad
    }

    fn name(&self) -> &str {
        "site_model_load"
    }

    async fn handle(&self, event: &mut BootstrapEvent) -> BootstrapResult<()> {
        let missing_host = || BootstrapError::MissingHost {
            param: self.host_param.clone(),
        };
        let host = event
            .route()
            .and_then(|route| route.param(&self.host_param))
            .ok_or_else(missing_host)?;
        let key = SiteKey::from_host(host).ok_or_else(missing_host)?;

        let repository = Arc::clone(&self.repository);
        let lookup = key.clone();
        let site = self
            .state
            .sites()
            .get_or_resolve(&key, move || async move {
                match repository.resolve_by_host(lookup.as_str()).await {
                    Ok(Some(site)) => Ok(site),
                    Ok(None) => Err(BootstrapError::UnresolvedSite {
                        host: lookup.to_string(),
                    }),
                    Err(source) => Err(BootstrapError::SiteLookup {
                        host: lookup.to_string(),
                        source,
                    }),
                }
            })
            .await?;

        debug!(host = %key, site = %site.key, "Site resolved");
        event.set_site(site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitekit_core::RouteContext;
    use sitekit_test::{MockSiteRepository, test_site};
    use uuid::Uuid;

    fn event_for(host: &str) -> BootstrapEvent {
        let route = RouteContext::builder().param("host", host).build();
        BootstrapEvent::new(Uuid::new_v4()).with_route(Arc::new(route))
    }

    #[tokio::test]
    async fn test_resolves_and_caches() {
        let repo = Arc::new(MockSiteRepository::new().with_site(test_site("example.com")));
        let state = Arc::new(ProcessState::new());
        let listener = SiteModelLoadListener::new(
            Arc::clone(&repo) as Arc<dyn SiteRepository>,
            Arc::clone(&state),
            "host",
        );

        let mut event = event_for("Example.com:8080");
        listener.handle(&mut event).await.unwrap();
        assert_eq!(event.site().unwrap().key.as_str(), "example.com");

        let mut again = event_for("example.com");
        listener.handle(&mut again).await.unwrap();
        assert_eq!(repo.resolve_calls("example.com"), 1);
        assert_eq!(state.sites().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_host() {
        let listener = SiteModelLoadListener::new(
            Arc::new(MockSiteRepository::new()),
            Arc::new(ProcessState::new()),
            "domain",
        );

        let mut no_route = BootstrapEvent::new(Uuid::new_v4());
        let err = listener.handle(&mut no_route).await.unwrap_err();
        assert!(matches!(err, BootstrapError::MissingHost { ref param } if param == "domain"));

        let mut wrong_param = event_for("example.com");
        assert!(listener.handle(&mut wrong_param).await.is_err());
    }

    #[tokio::test]
    async fn test_unresolved_and_failed_lookup() {
        let repo = Arc::new(MockSiteRepository::new().failing_host("broken.test"));
        let state = Arc::new(ProcessState::new());
        let listener = SiteModelLoadListener::new(repo, Arc::clone(&state), "host");

        let err = listener
            .handle(&mut event_for("nowhere.test"))
            .await
            .unwrap_err();
        assert!(err.is_unresolved_site());

        let err = listener
            .handle(&mut event_for("broken.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::SiteLookup { .. }));
        assert!(state.sites().is_empty());
    }
}
