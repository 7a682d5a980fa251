//! Sitekit storage helpers.
//!
//! Provides the separator-agnostic path algebra used for storage paths and a
//! module storage locator built on it.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Storage error types.
pub mod error;
/// Module storage lookup.
pub mod locator;
/// Storage path normalization and composition.
pub mod path;

pub use error::{StorageError, StorageResult};
pub use locator::StorageModuleLocator;
pub use path::{DEFAULT_SEPARATOR, PathBuilder};
