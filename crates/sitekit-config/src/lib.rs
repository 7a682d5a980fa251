#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Layered configuration for the sitekit bootstrap pipeline.
//!
//! # Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Explicit file** passed by the embedding application
//! 2. **User** (`~/.sitekit/config.toml`)
//! 3. **System** (`/etc/sitekit/config.toml`)
//! 4. **Environment variables** (`SITEKIT_*`), fallback only
//! 5. **Embedded defaults** (`defaults.toml` compiled into the binary)
//!
//! The crate has no dependency on the other sitekit crates. The kernel turns
//! a validated [`Config`] into its runtime settings.
//!
//! ```rust,no_run
//! use sitekit_config::Config;
//!
//! let resolved = Config::load(None).unwrap();
//! println!("core modules: {:?}", resolved.config.bootstrap.core_modules);
//! ```

/// Environment variable fallbacks.
pub mod env;
/// Configuration error types.
pub mod error;
/// File discovery and layered loading.
pub mod loader;
/// Deep merge of TOML trees.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{LoadOptions, ResolvedConfig};
pub use merge::{ConfigLayer, FieldSources};
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file cannot be read or parsed, an
    /// environment fallback is malformed, or validation fails.
    pub fn load(explicit_file: Option<&std::path::Path>) -> ConfigResult<ResolvedConfig> {
        let mut options = LoadOptions::from_environment();
        options.explicit_file = explicit_file.map(std::path::Path::to_path_buf);
        loader::load(&options)
    }

    /// Load a single file over the embedded defaults, ignoring every other
    /// layer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
