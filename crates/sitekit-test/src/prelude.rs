//! Prelude module - commonly used test utilities.
//!
//! Use `use sitekit_test::prelude::*;` in test modules.

// Mocks
pub use crate::{
    CountingListener, MockModuleManager, MockModuleManagerFactory, MockSecurityManager,
    MockSecurityProvider, MockSiteRepository, RecordingService,
};

// Fixtures
pub use crate::{site_config, test_route, test_site};

// Harness
pub use crate::{module_dir, setup_test_logging, setup_test_logging_default};
