//! Sitekit Test - shared test utilities.
//!
//! Mock collaborators, fixtures and harness helpers used as a
//! dev-dependency across the workspace.
//!
//! ```rust,ignore
//! use sitekit_test::{MockSiteRepository, test_route, test_site};
//!
//! let repo = MockSiteRepository::new().with_site(test_site("example.com"));
//! let route = test_route("example.com");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
