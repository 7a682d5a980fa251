//! Error types raised by bootstrap phases.

use thiserror::Error;

use crate::phase::Phase;
use crate::site::SiteKey;

/// Boxed error returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while bootstrapping a site for a request.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The route snapshot does not carry a usable host value.
    #[error("route does not provide a host in parameter '{param}'")]
    MissingHost {
        /// Name of the route parameter expected to hold the host.
        param: String,
    },

    /// No site matches the request host.
    #[error("no site is configured for host '{host}'")]
    UnresolvedSite {
        /// The host that failed to resolve.
        host: String,
    },

    /// The site repository failed while resolving a host.
    #[error("site lookup for host '{host}' failed: {source}")]
    SiteLookup {
        /// The host being resolved.
        host: String,
        /// Underlying repository error.
        #[source]
        source: BoxError,
    },

    /// The site configuration could not be loaded.
    #[error("failed to load configuration for site '{site}': {source}")]
    ConfigLoad {
        /// The site whose configuration failed to load.
        site: SiteKey,
        /// Underlying repository error.
        #[source]
        source: BoxError,
    },

    /// The site configuration declares modules in an unusable shape.
    #[error("invalid module list for site '{site}': {message}")]
    InvalidModuleList {
        /// The offending site.
        site: SiteKey,
        /// What is wrong with the declaration.
        message: String,
    },

    /// The module manager could not be created.
    #[error("failed to create module manager: {source}")]
    ModuleManagerInit {
        /// Underlying factory error.
        #[source]
        source: BoxError,
    },

    /// A module failed to load.
    #[error("failed to load module '{module}': {source}")]
    ModuleLoad {
        /// Name of the module.
        module: String,
        /// Underlying loader error.
        #[source]
        source: BoxError,
    },

    /// A service rejected an injected manager reference.
    #[error("injection into service '{service}' failed: {source}")]
    Injection {
        /// Registry name of the service.
        service: String,
        /// Underlying service error.
        #[source]
        source: BoxError,
    },

    /// A phase needed the resolved site but none is present.
    #[error("no site has been resolved before phase {phase}")]
    MissingSite {
        /// The phase that needed the site.
        phase: Phase,
    },

    /// A listener wrote event state outside the phase that owns it.
    #[error("'{field}' cannot be written during phase {phase}")]
    PhaseViolation {
        /// The event field being written.
        field: &'static str,
        /// The phase in which the write was attempted.
        phase: Phase,
    },

    /// The caller cancelled the bootstrap.
    #[error("bootstrap cancelled during phase {phase}")]
    Cancelled {
        /// The phase that was running or about to run.
        phase: Phase,
    },

    /// A phase exceeded its time budget.
    #[error("phase {phase} timed out after {timeout_ms}ms")]
    TimedOut {
        /// The phase that timed out.
        phase: Phase,
        /// The budget in milliseconds.
        timeout_ms: u64,
    },
}

impl BootstrapError {
    /// Whether this error means the host has no site.
    ///
    /// The request layer turns this into a "no such site" response.
    #[must_use]
    pub fn is_unresolved_site(&self) -> bool {
        matches!(self, Self::UnresolvedSite { .. })
    }
}

/// Result type for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
