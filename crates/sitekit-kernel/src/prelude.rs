//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sitekit_kernel::prelude::*;` to import all essential types.

// Errors
pub use crate::{KernelError, KernelResult, PrepareSiteError};

// Orchestration
pub use crate::{BootstrapSettings, FailurePolicy, PreparedSite, SiteBootstrapOrchestrator};

// Shared state
pub use crate::ProcessState;

// Services
pub use crate::ModuleResourceManager;
