//! Site model.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BootstrapError, BootstrapResult};

/// Opaque site configuration: a JSON object.
pub type SiteConfig = serde_json::Map<String, Value>;

/// Config key holding the site-declared module list.
pub const MODULES_KEY: &str = "modules";

/// Host-derived identity of a site.
///
/// Hosts are normalized before keying: surrounding whitespace, a port suffix
/// and a trailing dot are removed and the result is lower-cased, so
/// `Example.COM.:8080` and `example.com` share one key. IPv6 literals keep
/// their colons; `[::1]:8080`, `[::1]` and `::1` all key as `::1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteKey(String);

impl SiteKey {
    /// Derive a key from a request host. Returns `None` for an empty host.
    #[must_use]
    pub fn from_host(host: &str) -> Option<Self> {
        let host = strip_port(host.trim()).trim_end_matches('.');
        if host.is_empty() {
            return None;
        }
        Some(Self(host.to_ascii_lowercase()))
    }

    /// The normalized host.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Drop a numeric port. Only a bracketed literal or a host with a single
/// colon can carry one; bare IPv6 addresses are returned unchanged.
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((inner, "")) => inner,
            Some((inner, suffix)) if suffix.strip_prefix(':').is_some_and(is_port) => inner,
            _ => host,
        };
    }
    match host.split_once(':') {
        Some((name, port)) if is_port(port) => name,
        _ => host,
    }
}

fn is_port(port: &str) -> bool {
    !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
}

/// A tenant served by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Host-derived identity.
    pub key: SiteKey,
    /// Human-readable name.
    pub name: String,
    /// Every host this site answers to.
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Site configuration. Holds the model's own settings after resolution
    /// and the fully merged configuration after the config phase.
    #[serde(default)]
    pub config: SiteConfig,
}

impl Site {
    /// Create a site with an empty configuration.
    #[must_use]
    pub fn new(key: SiteKey, name: impl Into<String>) -> Self {
        Self {
            hosts: vec![key.as_str().to_owned()],
            key,
            name: name.into(),
            config: SiteConfig::new(),
        }
    }

    /// Add an alias host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Set a configuration value.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    /// Declare the site's own modules.
    #[must_use]
    pub fn with_modules<I, S>(self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let modules = modules
            .into_iter()
            .map(|m| Value::String(m.into()))
            .collect();
        self.with_config(MODULES_KEY, Value::Array(modules))
    }

    /// Modules declared in the site configuration, in declaration order.
    ///
    /// A missing or `null` entry means no site modules.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::InvalidModuleList`] if the entry is not an
    /// array of non-empty strings.
    pub fn declared_modules(&self) -> BootstrapResult<Vec<String>> {
        let invalid = |message: String| BootstrapError::InvalidModuleList {
            site: self.key.clone(),
            message,
        };

        match self.config.get(MODULES_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(entries)) => entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| match entry.as_str().map(str::trim) {
                    Some(name) if !name.is_empty() => Ok(name.to_owned()),
                    Some(_) => Err(invalid(format!("entry {idx} is empty"))),
                    None => Err(invalid(format!("entry {idx} is not a string: {entry}"))),
                })
                .collect(),
            Some(other) => Err(invalid(format!("expected an array, found {other}"))),
        }
    }
}
