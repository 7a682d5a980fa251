//! Sitekit Core - Foundation types and traits for the tenant bootstrap pipeline.
//!
//! This crate provides:
//! - The [`Phase`] vocabulary of the bootstrap sequence
//! - The [`Site`] model and host-derived [`SiteKey`]
//! - Route snapshots handed to the pipeline by the request layer
//! - Error types shared by every phase
//! - Collaborator traits (site repository, module storage, module managers,
//!   security) and the process-wide [`ServiceRegistry`]

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod module;
pub mod phase;
pub mod route;
pub mod security;
pub mod service;
pub mod site;
pub mod traits;

pub use error::{BootstrapError, BootstrapResult, BoxError};
pub use module::ModuleManager;
pub use phase::Phase;
pub use route::{RouteContext, RouteContextBuilder};
pub use security::SecurityManager;
pub use service::{Service, ServiceRegistry, WantsModuleManager, WantsSecurityManager};
pub use site::{Site, SiteConfig, SiteKey};
pub use traits::{
    ModuleManagerFactory, ModuleStorageLocator, SecurityManagerProvider, SiteRepository,
};
