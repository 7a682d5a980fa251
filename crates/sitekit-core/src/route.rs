//! Immutable snapshot of request routing data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Routing data captured when the request was matched.
///
/// The pipeline only reads it; build one with [`RouteContext::builder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteContext {
    route_name: Option<String>,
    params: BTreeMap<String, String>,
}

impl RouteContext {
    /// Start building a route snapshot.
    #[must_use]
    pub fn builder() -> RouteContextBuilder {
        RouteContextBuilder::default()
    }

    /// Name of the matched route, if the router reported one.
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    /// Look up a route parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All route parameters.
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

/// Builder for [`RouteContext`].
#[derive(Debug, Default)]
pub struct RouteContextBuilder {
    route_name: Option<String>,
    params: BTreeMap<String, String>,
}

impl RouteContextBuilder {
    /// Set the matched route name.
    #[must_use]
    pub fn route_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = Some(name.into());
        self
    }

    /// Add a route parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Freeze the snapshot.
    #[must_use]
    pub fn build(self) -> RouteContext {
        RouteContext {
            route_name: self.route_name,
            params: self.params,
        }
    }
}
