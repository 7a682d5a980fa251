//! Orchestrators assembled from a configuration file.

use std::sync::Arc;
use std::time::Duration;

use sitekit_config::{Config, ConfigError, ConfigLayer, LoadOptions};
use sitekit_core::ModuleStorageLocator;
use sitekit_kernel::{
    BootstrapSettings, FailurePolicy, SiteBootstrapOrchestrator, locator_from_config,
};
use sitekit_test::{
    MockModuleManagerFactory, MockSecurityProvider, MockSiteRepository, module_dir, test_route,
    test_site,
};

fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("sitekit.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn config_file_drives_the_pipeline() {
    let modules = module_dir(&["system", "blog", "shop"]);
    let config_dir = tempfile::tempdir().unwrap();
    let path = write_config(
        config_dir.path(),
        &format!(
            r#"
[bootstrap]
core_modules = ["system"]
route_host_param = "domain"
module_failure_policy = "skip"
phase_timeout_ms = 2000

[storage]
module_root = "/srv/modules"
module_dir = '{}'

[site_defaults]
locale = "en"
"#,
            modules.path().display()
        ),
    );

    let config = Config::load_file(&path).unwrap();
    let settings = BootstrapSettings::from_config(&config).unwrap();
    assert_eq!(settings.failure_policy, FailurePolicy::Skip);
    assert_eq!(settings.phase_timeout, Some(Duration::from_secs(2)));

    let locator = locator_from_config(&config).unwrap();
    assert_eq!(
        locator.locate("blog").as_deref(),
        Some("/srv/modules/blog")
    );

    let site = test_site("example.com").with_modules(["blog", "forum"]);
    let orchestrator = SiteBootstrapOrchestrator::builder()
        .settings(settings)
        .site_repository(Arc::new(MockSiteRepository::new().with_site(site)))
        .module_locator(Arc::new(locator))
        .module_manager_factory(Arc::new(MockModuleManagerFactory::new()))
        .security_provider(Arc::new(MockSecurityProvider::new("tenant")))
        .build()
        .unwrap();
    orchestrator.bootstrap();

    let route = sitekit_core::RouteContext::builder()
        .route_name("page")
        .param("domain", "example.com")
        .build();
    let prepared = orchestrator.prepare_site(Some(route)).await.unwrap();
    assert_eq!(prepared.module_names, ["system", "blog"]);
    assert_eq!(prepared.site.config["locale"], "en");

    // The default host parameter is no longer read.
    let err = orchestrator
        .prepare_site(Some(test_route("example.com")))
        .await
        .unwrap_err();
    assert!(!err.is_unresolved_site());
}

#[test]
fn layered_load_reports_sources() {
    let home = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(home.path().join(".sitekit")).unwrap();
    std::fs::write(
        home.path().join(".sitekit/config.toml"),
        "[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    let options = LoadOptions {
        home_dir: Some(home.path().to_path_buf()),
        env_vars: [("SITEKIT_CORE_MODULES".to_owned(), "system, user".to_owned())]
            .into_iter()
            .collect(),
        ..LoadOptions::default()
    };

    let resolved = sitekit_config::loader::load(&options).unwrap();
    assert_eq!(resolved.config.logging.level, "debug");
    assert_eq!(resolved.config.bootstrap.core_modules, ["system", "user"]);
    assert_eq!(resolved.source_of("logging.level"), Some(ConfigLayer::User));
    assert_eq!(
        resolved.source_of("bootstrap.core_modules"),
        Some(ConfigLayer::Environment)
    );
}

#[test]
fn invalid_settings_are_rejected_before_build() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[bootstrap]\ncore_modules = [\"a\", \"a\"]\n");
    assert!(matches!(
        Config::load_file(&path),
        Err(ConfigError::ValidationError { .. })
    ));

    let missing = locator_from_config(&{
        let mut config = Config::default();
        config.storage.module_dir = Some(dir.path().join("absent"));
        config
    });
    assert!(missing.is_err());
}
