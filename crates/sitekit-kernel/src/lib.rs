//! Sitekit Kernel - the per-request site bootstrap pipeline.
//!
//! [`SiteBootstrapOrchestrator`] resolves the site behind a request's host,
//! merges its configuration, collects and loads its modules, then injects
//! late-bound managers into registered services. Each step is a listener on
//! one [`Phase`](sitekit_core::Phase):
//!
//! | phase              | listener                           |
//! |--------------------|------------------------------------|
//! | `site_model_load`  | [`SiteModelLoadListener`]          |
//! | `config`           | [`SiteConfigListener`]             |
//! | `collect_modules`  | [`CollectModulesListener`]         |
//! | `load_modules`     | [`LoadModulesListener`]            |
//! | `load_modules_post`| [`InjectModuleManagerListener`], [`InjectSecurityManagerListener`] |
//!
//! Sites and modules are cached in a shared [`ProcessState`], so concurrent
//! requests for the same host resolve it once and each module is loaded at
//! most once per process.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]

pub mod prelude;

pub mod error;
pub mod listeners;
pub mod merge;
pub mod orchestrator;
pub mod resources;
pub mod settings;
pub mod state;

pub use error::{KernelError, KernelResult, PrepareSiteError};
pub use listeners::{
    CollectModulesListener, InjectModuleManagerListener, InjectSecurityManagerListener,
    LoadModulesListener, SiteConfigListener, SiteModelLoadListener,
};
pub use orchestrator::{OrchestratorBuilder, PreparedSite, SiteBootstrapOrchestrator};
pub use resources::ModuleResourceManager;
pub use settings::{BootstrapSettings, init_logging, locator_from_config};
pub use sitekit_config::FailurePolicy;
pub use state::{LoadOutcome, ModuleLedger, ProcessState, SiteCache};
