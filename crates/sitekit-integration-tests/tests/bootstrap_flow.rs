//! End-to-end runs of the bootstrap phases against mock collaborators.

mod common;

use std::sync::Arc;

use common::PipelineBuilder;
use serde_json::json;
use sitekit_core::{BootstrapError, Phase, Service};
use sitekit_kernel::{
    BootstrapSettings, FailurePolicy, ModuleResourceManager, PrepareSiteError, ProcessState,
};
use sitekit_storage::{PathBuilder, StorageModuleLocator};
use sitekit_test::{
    CountingListener, MockModuleManagerFactory, MockSiteRepository, RecordingService,
    site_config, test_route, test_site,
};

#[tokio::test]
async fn prepares_site_with_core_modules_first() {
    let site = test_site("example.com").with_modules(["blog", "system", "gallery", "missing"]);
    let pipeline = PipelineBuilder::new(MockSiteRepository::new().with_site(site))
        .storage_modules(&["blog", "gallery"])
        .settings(BootstrapSettings::default().with_core_modules(["system", "user"]))
        .build();

    let prepared = pipeline
        .orchestrator
        .prepare_site(Some(test_route("Example.com:8080")))
        .await
        .unwrap();

    assert_eq!(prepared.site.key.as_str(), "example.com");
    assert_eq!(prepared.module_names, ["system", "user", "blog", "gallery"]);
    assert!(prepared.skipped_modules.is_empty());
    assert_eq!(
        pipeline.factory.load_journal(),
        ["system", "user", "blog", "gallery"]
    );
    assert_eq!(
        prepared.module_manager.unwrap().module_names(),
        prepared.module_names
    );
}

#[tokio::test]
async fn merges_defaults_site_and_fetched_config() {
    let site = test_site("example.com")
        .with_config("theme", json!({"name": "classic", "dark": false}));
    let repo = MockSiteRepository::new()
        .with_site(site)
        .with_config("example.com", site_config(json!({"theme": {"dark": true}})));
    let settings = BootstrapSettings::default()
        .with_site_defaults(site_config(json!({"locale": "en", "theme": {"name": "base"}})));
    let pipeline = PipelineBuilder::new(repo).settings(settings).build();

    let prepared = pipeline
        .orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap();

    assert_eq!(prepared.site.config["locale"], "en");
    assert_eq!(
        prepared.site.config["theme"],
        json!({"name": "classic", "dark": true})
    );
}

#[tokio::test]
async fn unresolved_site_stops_before_later_phases() {
    let config_listener = Arc::new(CountingListener::new(Phase::Config));
    let post_listener = Arc::new(CountingListener::new(Phase::LoadModulesPost));
    let pipeline = PipelineBuilder::new(MockSiteRepository::new())
        .listener(Arc::clone(&config_listener) as _)
        .listener(Arc::clone(&post_listener) as _)
        .build();

    let err = pipeline
        .orchestrator
        .prepare_site(Some(test_route("nowhere.test")))
        .await
        .unwrap_err();

    assert!(err.is_unresolved_site());
    assert_eq!(err.phase(), Some(Phase::SiteModelLoad));
    assert_eq!(config_listener.calls(), 0);
    assert_eq!(post_listener.calls(), 0);
    assert_eq!(pipeline.factory.created(), 0);
}

#[tokio::test]
async fn missing_host_parameter() {
    let pipeline = PipelineBuilder::new(MockSiteRepository::new()).build();

    let err = pipeline.orchestrator.prepare_site(None).await.unwrap_err();
    assert!(matches!(
        err.bootstrap_error(),
        Some(BootstrapError::MissingHost { .. })
    ));
    assert!(!err.is_unresolved_site());
}

#[tokio::test]
async fn repeated_bootstrap_registers_listeners_once() {
    let counter = Arc::new(CountingListener::new(Phase::Config));
    let pipeline = PipelineBuilder::new(MockSiteRepository::new().with_site(test_site("a.test")))
        .listener(Arc::clone(&counter) as _)
        .build();

    pipeline.orchestrator.bootstrap();
    pipeline.orchestrator.bootstrap();

    let dispatcher = pipeline.orchestrator.dispatcher();
    assert_eq!(dispatcher.listener_names(Phase::Config), ["site_config", "counting"]);
    for phase in Phase::ALL {
        assert!(dispatcher.listener_count(phase) >= 1, "{phase} has no listener");
    }

    pipeline
        .orchestrator
        .prepare_site(Some(test_route("a.test")))
        .await
        .unwrap();
    assert_eq!(counter.calls(), 1);
}

#[tokio::test]
async fn stop_propagation_is_phase_local() {
    let stopper = Arc::new(CountingListener::named(Phase::Config, "stopper").stopping());
    let skipped = Arc::new(CountingListener::named(Phase::Config, "skipped"));
    let next_phase = Arc::new(CountingListener::named(Phase::CollectModules, "next"));
    let site = test_site("example.com").with_modules(["blog"]);
    let pipeline = PipelineBuilder::new(MockSiteRepository::new().with_site(site))
        .storage_modules(&["blog"])
        .listener(Arc::clone(&stopper) as _)
        .listener(Arc::clone(&skipped) as _)
        .listener(Arc::clone(&next_phase) as _)
        .build();

    let prepared = pipeline
        .orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap();

    assert_eq!(stopper.calls(), 1);
    assert_eq!(skipped.calls(), 0);
    assert_eq!(next_phase.calls(), 1);
    assert_eq!(prepared.module_names, ["blog"]);
}

#[tokio::test]
async fn abort_policy_fails_the_request() {
    let site = test_site("example.com").with_modules(["blog", "broken"]);
    let pipeline = PipelineBuilder::new(MockSiteRepository::new().with_site(site))
        .storage_modules(&["blog", "broken"])
        .factory(MockModuleManagerFactory::new().failing_module("broken"))
        .build();

    let err = pipeline
        .orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::LoadModules));
    assert!(matches!(
        err.bootstrap_error(),
        Some(BootstrapError::ModuleLoad { module, .. }) if module == "broken"
    ));
    assert!(pipeline.state().modules().is_loaded("blog"));
    assert!(!pipeline.state().modules().is_loaded("broken"));
}

#[tokio::test]
async fn skip_policy_reports_skipped_modules() {
    let site = test_site("example.com").with_modules(["broken", "blog"]);
    let pipeline = PipelineBuilder::new(MockSiteRepository::new().with_site(site))
        .storage_modules(&["blog", "broken"])
        .factory(MockModuleManagerFactory::new().failing_module("broken"))
        .settings(BootstrapSettings::default().with_failure_policy(FailurePolicy::Skip))
        .build();

    let prepared = pipeline
        .orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap();

    assert_eq!(prepared.module_names, ["broken", "blog"]);
    assert_eq!(prepared.skipped_modules, ["broken"]);
    assert_eq!(pipeline.factory.load_journal(), ["blog"]);
}

#[tokio::test]
async fn injection_failures_do_not_fail_the_request() {
    let site = test_site("example.com").with_modules(["blog"]);
    let pipeline = PipelineBuilder::new(MockSiteRepository::new().with_site(site))
        .storage_modules(&["blog"])
        .build();

    let healthy = Arc::new(RecordingService::new());
    let services = pipeline.state().services();
    services.set("a.rejecting", Arc::new(RecordingService::new().failing()) as Arc<dyn Service>);
    services.set("b.healthy", Arc::clone(&healthy) as Arc<dyn Service>);

    pipeline
        .orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap();

    assert_eq!(healthy.module_manager_injections(), 1);
    assert_eq!(healthy.last_module_names(), Some(vec!["blog".to_owned()]));
    assert_eq!(healthy.security_realm().as_deref(), Some("tenant"));
}

#[tokio::test]
async fn services_registered_by_modules_receive_injection() {
    let provided = Arc::new(RecordingService::new());
    let site = test_site("example.com").with_modules(["blog"]);
    let pipeline = PipelineBuilder::new(MockSiteRepository::new().with_site(site))
        .storage_modules(&["blog"])
        .factory(MockModuleManagerFactory::new().provides(
            "blog",
            "blog.feed",
            Arc::clone(&provided) as Arc<dyn Service>,
        ))
        .build();

    pipeline
        .orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap();

    assert!(pipeline.state().services().contains("blog.feed"));
    assert_eq!(provided.module_manager_injections(), 1);
}

#[tokio::test]
async fn resource_manager_resolves_module_resources() {
    let site = test_site("example.com").with_modules(["blog"]);
    let pipeline = PipelineBuilder::new(MockSiteRepository::new().with_site(site))
        .storage_modules(&["blog", "shop"])
        .build();

    let resources = pipeline.orchestrator.resource_manager();
    assert!(
        pipeline
            .state()
            .services()
            .contains(ModuleResourceManager::SERVICE_NAME)
    );
    assert_eq!(resources.resource_path("blog", "style.css"), None);

    pipeline
        .orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap();

    assert_eq!(
        resources.resource_path("blog", "style.css").as_deref(),
        Some("/modules/blog/resources/style.css")
    );
    assert_eq!(resources.resource_path("shop", "style.css"), None);
    assert_eq!(
        resources.module_manager().unwrap().module_names(),
        ["blog"]
    );
}

#[tokio::test]
async fn resource_lookups_survive_requests_for_other_sites() {
    let repo = MockSiteRepository::new()
        .with_site(test_site("a.test").with_modules(["blog"]))
        .with_site(test_site("b.test").with_modules(["shop"]));
    let pipeline = PipelineBuilder::new(repo)
        .storage_modules(&["blog", "shop"])
        .build();
    let resources = pipeline.orchestrator.resource_manager();

    pipeline
        .orchestrator
        .prepare_site(Some(test_route("a.test")))
        .await
        .unwrap();
    let blog_before = resources.resource_path("blog", "style.css");
    assert_eq!(
        blog_before.as_deref(),
        Some("/modules/blog/resources/style.css")
    );

    pipeline
        .orchestrator
        .prepare_site(Some(test_route("b.test")))
        .await
        .unwrap();

    assert_eq!(resources.resource_path("blog", "style.css"), blog_before);
    assert_eq!(
        resources.resource_path("shop", "logo.png").as_deref(),
        Some("/modules/shop/resources/logo.png")
    );
}

#[tokio::test]
async fn caller_registered_resource_manager_is_kept() {
    let state = Arc::new(ProcessState::new());
    let locator = StorageModuleLocator::new(PathBuilder::default(), "/custom").with_module("blog");
    let custom = Arc::new(ModuleResourceManager::new(
        Arc::new(locator),
        PathBuilder::default(),
        state.module_ledger(),
    ));
    state.services().set(
        ModuleResourceManager::SERVICE_NAME,
        Arc::clone(&custom) as Arc<dyn Service>,
    );

    let site = test_site("example.com").with_modules(["blog"]);
    let pipeline = PipelineBuilder::new(MockSiteRepository::new().with_site(site))
        .storage_modules(&["blog"])
        .state(state)
        .build();
    pipeline
        .orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap();

    assert!(custom.module_manager().is_some());
    assert_eq!(
        custom.resource_path("blog", "a.css").as_deref(),
        Some("/custom/blog/resources/a.css")
    );
}

#[tokio::test]
async fn prepare_before_bootstrap_is_rejected() {
    let orchestrator = sitekit_kernel::SiteBootstrapOrchestrator::builder()
        .site_repository(Arc::new(MockSiteRepository::new()))
        .module_locator(Arc::new(StorageModuleLocator::new(
            PathBuilder::default(),
            "/modules",
        )))
        .module_manager_factory(Arc::new(MockModuleManagerFactory::new()))
        .security_provider(Arc::new(sitekit_test::MockSecurityProvider::new("tenant")))
        .build()
        .unwrap();

    let err = orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap_err();
    assert!(matches!(err, PrepareSiteError::NotBootstrapped));
}
