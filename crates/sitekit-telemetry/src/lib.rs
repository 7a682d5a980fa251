//! Logging and request tracing for sitekit.
//!
//! - [`setup_logging`] installs a global `tracing` subscriber from a
//!   [`LogConfig`].
//! - [`RequestContext`] carries the ids of one bootstrap request and opens
//!   the span its log lines are nested under.
//!
//! With the `config` feature, a [`LogConfig`] can be built from the
//! `[logging]` section of a `sitekit-config` file.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::RequestContext;
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
