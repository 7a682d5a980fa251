//! Commonly used telemetry types.
//!
//! ```rust,no_run
//! use sitekit_telemetry::prelude::*;
//!
//! # fn main() -> TelemetryResult<()> {
//! setup_logging(&LogConfig::new("debug").with_directive("sitekit_kernel=trace"))?;
//!
//! let ctx = RequestContext::new("prepare_site").with_host("example.com");
//! let _guard = ctx.span().entered();
//! tracing::info!("bootstrapping");
//! # Ok(())
//! # }
//! ```

pub use crate::{TelemetryError, TelemetryResult};

pub use crate::{FileRotation, LogConfig, LogFormat, LogTarget};

pub use crate::{setup_default_logging, setup_logging};

pub use crate::RequestContext;
