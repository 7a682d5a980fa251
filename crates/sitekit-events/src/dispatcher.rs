//! Phase dispatcher.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use sitekit_core::{BootstrapResult, Phase};
use tracing::{debug, trace, warn};

use crate::event::BootstrapEvent;
use crate::listener::{ListenerId, PhaseListener};

struct Registration {
    id: ListenerId,
    listener: Arc<dyn PhaseListener>,
}

/// Outcome of firing one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireReport {
    /// The phase that was fired.
    pub phase: Phase,
    /// Listeners that ran.
    pub invoked: usize,
    /// Listeners skipped because propagation was stopped.
    pub skipped: usize,
}

/// Fires bootstrap phases against their registered listeners.
///
/// Listeners run strictly in registration order; there is no priority
/// reordering.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<HashMap<Phase, Vec<Registration>>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: Vec<(Phase, usize)> = Phase::ALL
            .iter()
            .map(|phase| (*phase, self.listener_count(*phase)))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("listeners", &counts)
            .finish()
    }
}

impl EventDispatcher {
    /// Create a dispatcher with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener to `phase`.
    pub fn register(&self, phase: Phase, listener: Arc<dyn PhaseListener>) -> ListenerId {
        if listener.phase() != phase {
            warn!(
                listener = listener.name(),
                bound_phase = %listener.phase(),
                phase = %phase,
                "Registering listener outside its bound phase"
            );
        }

        let id = ListenerId::new();
        debug!(listener = listener.name(), phase = %phase, %id, "Listener registered");

        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        listeners
            .entry(phase)
            .or_default()
            .push(Registration { id, listener });
        id
    }

    /// Append a listener to the phase it is bound to.
    pub fn attach(&self, listener: Arc<dyn PhaseListener>) -> ListenerId {
        self.register(listener.phase(), listener)
    }

    /// Remove a listener. Returns `true` if it was registered.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for registrations in listeners.values_mut() {
            if let Some(idx) = registrations.iter().position(|r| r.id == id) {
                registrations.remove(idx);
                debug!(%id, "Listener unregistered");
                return true;
            }
        }
        false
    }

    /// Number of listeners registered for `phase`.
    #[must_use]
    pub fn listener_count(&self, phase: Phase) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&phase)
            .map_or(0, Vec::len)
    }

    /// Names of the listeners registered for `phase`, in invocation order.
    #[must_use]
    pub fn listener_names(&self, phase: Phase) -> Vec<String> {
        self.snapshot(phase)
            .iter()
            .map(|l| l.name().to_owned())
            .collect()
    }

    /// Fire `phase` against `event`.
    ///
    /// The stop flag is cleared first. Each listener then runs in order
    /// unless a previous listener of this phase stopped propagation.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a listener; the phase's remaining
    /// listeners do not run.
    pub async fn fire(
        &self,
        phase: Phase,
        event: &mut BootstrapEvent,
    ) -> BootstrapResult<FireReport> {
        event.enter_phase(phase);

        let listeners = self.snapshot(phase);
        let mut report = FireReport {
            phase,
            invoked: 0,
            skipped: 0,
        };

        for listener in listeners {
            if event.is_propagation_stopped() {
                trace!(listener = listener.name(), phase = %phase, "Propagation stopped, skipping");
                report.skipped = report.skipped.saturating_add(1);
                continue;
            }

            trace!(listener = listener.name(), phase = %phase, "Invoking listener");
            report.invoked = report.invoked.saturating_add(1);
            if let Err(e) = listener.handle(event).await {
                warn!(
                    listener = listener.name(),
                    phase = %phase,
                    error = %e,
                    "Listener failed"
                );
                return Err(e);
            }
        }

        debug!(
            phase = %phase,
            invoked = report.invoked,
            skipped = report.skipped,
            "Phase fired"
        );
        Ok(report)
    }

    /// Clone the phase's listeners so no lock is held while they run.
    fn snapshot(&self, phase: Phase) -> Vec<Arc<dyn PhaseListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&phase)
            .map(|regs| regs.iter().map(|r| Arc::clone(&r.listener)).collect())
            .unwrap_or_default()
    }
}
