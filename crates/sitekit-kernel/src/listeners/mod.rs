//! The built-in phase listeners, in the order they are registered.

mod collect_modules;
mod inject;
mod load_modules;
mod site_config;
mod site_model;

pub use collect_modules::CollectModulesListener;
pub use inject::{InjectModuleManagerListener, InjectSecurityManagerListener};
pub use load_modules::LoadModulesListener;
pub use site_config::SiteConfigListener;
pub use site_model::SiteModelLoadListener;
