//! Bootstrap phases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One named stage of the site bootstrap sequence.
///
/// Phases always run in the order of [`Phase::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Resolve the site model from the request host.
    SiteModelLoad,
    /// Load and merge the site configuration.
    Config,
    /// Compute the ordered module list for the site.
    CollectModules,
    /// Load every collected module into the process.
    LoadModules,
    /// Inject late-bound managers into registered services.
    LoadModulesPost,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 5] = [
        Phase::SiteModelLoad,
        Phase::Config,
        Phase::CollectModules,
        Phase::LoadModules,
        Phase::LoadModulesPost,
    ];

    /// Stable name of the phase, as used in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Phase::SiteModelLoad => "site_model_load",
            Phase::Config => "config",
            Phase::CollectModules => "collect_modules",
            Phase::LoadModules => "load_modules",
            Phase::LoadModulesPost => "load_modules_post",
        }
    }

    /// The phase that runs after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::SiteModelLoad => Some(Phase::Config),
            Phase::Config => Some(Phase::CollectModules),
            Phase::CollectModules => Some(Phase::LoadModules),
            Phase::LoadModules => Some(Phase::LoadModulesPost),
            Phase::LoadModulesPost => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
