//! Test fixtures.

use serde_json::Value;
use sitekit_core::{RouteContext, Site, SiteConfig, SiteKey};

/// A site keyed by `host`, named after it, with empty configuration.
///
/// # Panics
///
/// Panics if `host` normalizes to an empty key.
#[must_use]
pub fn test_site(host: &str) -> Site {
    let key = SiteKey::from_host(host).expect("fixture host must not be empty");
    Site::new(key, host)
}

/// A route for `host`, carried in the `host` parameter.
#[must_use]
pub fn test_route(host: &str) -> RouteContext {
    RouteContext::builder()
        .route_name("page")
        .param("host", host)
        .build()
}

/// Turn a JSON object literal into a [`SiteConfig`].
///
/// # Panics
///
/// Panics if `value` is not an object.
#[must_use]
pub fn site_config(value: Value) -> SiteConfig {
    match value {
        Value::Object(map) => map,
        other => panic!("site config fixture must be an object, got {other}"),
    }
}
