//! Sitekit Events - the per-request bootstrap event and its phase dispatcher.
//!
//! This crate provides:
//! - [`BootstrapEvent`], the mutable context threaded through every phase
//! - [`PhaseListener`], a single-phase unit of bootstrap work
//! - [`EventDispatcher`], which fires a phase's listeners in registration order
//!
//! # Propagation
//!
//! Firing a phase clears the event's stop flag first. A listener that calls
//! [`BootstrapEvent::stop_propagation`] prevents the remaining listeners of
//! *that phase* from running; later phases are unaffected. Only an error
//! returned by a listener aborts the rest of the pipeline.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod dispatcher;
mod event;
mod listener;

pub use dispatcher::{EventDispatcher, FireReport};
pub use event::BootstrapEvent;
pub use listener::{ListenerId, PhaseListener};
