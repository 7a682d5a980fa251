//! Phase listener trait.

use std::fmt;

use async_trait::async_trait;
use sitekit_core::{BootstrapResult, Phase};
use uuid::Uuid;

use crate::event::BootstrapEvent;

/// One unit of bootstrap work, bound to a single phase.
///
/// Listeners hold only the collaborators they were built with; everything
/// request-specific lives on the [`BootstrapEvent`].
#[async_trait]
pub trait PhaseListener: Send + Sync {
    /// The phase this listener belongs to.
    fn phase(&self) -> Phase;

    /// Name for logs and diagnostics.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Run the listener against the event.
    ///
    /// Recoverable problems should be logged and swallowed here; a returned
    /// error aborts the whole bootstrap.
    ///
    /// # Errors
    ///
    /// Returns a [`sitekit_core::BootstrapError`] for failures that must abort
    /// the bootstrap.
    async fn handle(&self, event: &mut BootstrapEvent) -> BootstrapResult<()>;
}

/// Registration handle for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
