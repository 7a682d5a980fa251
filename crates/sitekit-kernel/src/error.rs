//! Kernel error types.

use sitekit_config::ConfigError;
use sitekit_core::{BootstrapError, Phase};
use sitekit_storage::StorageError;
use sitekit_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while assembling the orchestrator.
#[derive(Debug, Error)]
pub enum KernelError {
    /// A required collaborator was not supplied to the builder.
    #[error("orchestrator requires a {0}")]
    MissingCollaborator(&'static str),

    /// A bootstrap setting is unusable.
    #[error("invalid setting {field}: {message}")]
    InvalidSetting {
        /// Setting name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Storage setup failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Result type for kernel assembly.
pub type KernelResult<T> = Result<T, KernelError>;

/// Why a request's site could not be prepared.
#[derive(Debug, Error)]
pub enum PrepareSiteError {
    /// `prepare_site` ran before `bootstrap`.
    #[error("orchestrator has not been bootstrapped")]
    NotBootstrapped,

    /// A phase failed; later phases did not run.
    #[error("bootstrap failed in phase {phase}: {source}")]
    Phase {
        /// The failing phase.
        phase: Phase,
        /// The phase's error.
        #[source]
        source: BootstrapError,
    },
}

impl PrepareSiteError {
    /// True when no site is configured for the request's host.
    #[must_use]
    pub fn is_unresolved_site(&self) -> bool {
        matches!(self, Self::Phase { source, .. } if source.is_unresolved_site())
    }

    /// The phase that failed, if any ran.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::NotBootstrapped => None,
            Self::Phase { phase, .. } => Some(*phase),
        }
    }

    /// The underlying phase error.
    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        match self {
            Self::NotBootstrapped => None,
            Self::Phase { source, .. } => Some(source),
        }
    }
}
