//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sitekit_events::prelude::*;` to import all essential types.

pub use crate::{BootstrapEvent, EventDispatcher, FireReport, ListenerId, PhaseListener};
