//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sitekit_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{BootstrapError, BootstrapResult, BoxError};

// Pipeline vocabulary
pub use crate::{Phase, RouteContext, Site, SiteConfig, SiteKey};

// Services and capabilities
pub use crate::{
    ModuleManager, SecurityManager, Service, ServiceRegistry, WantsModuleManager,
    WantsSecurityManager,
};

// Collaborators
pub use crate::{ModuleManagerFactory, ModuleStorageLocator, SecurityManagerProvider, SiteRepository};
