//! Configuration file discovery and layered loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env;
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{self, ConfigLayer, FieldSources};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// System-wide config location.
const SYSTEM_CONFIG_PATH: &str = "/etc/sitekit/config.toml";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Inputs to [`load`]. Tests build this directly; applications usually
/// start from [`LoadOptions::from_environment`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// System config file, skipped when absent on disk.
    pub system_file: Option<PathBuf>,
    /// Home directory; `~/.sitekit/config.toml` is read from here.
    pub home_dir: Option<PathBuf>,
    /// File named by the application. Must exist.
    pub explicit_file: Option<PathBuf>,
    /// Environment snapshot used for fallbacks.
    pub env_vars: HashMap<String, String>,
}

impl LoadOptions {
    /// Standard locations plus the current process environment.
    #[must_use]
    pub fn from_environment() -> Self {
        Self {
            system_file: Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
            home_dir: directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()),
            explicit_file: None,
            env_vars: env::collect_env_vars(),
        }
    }
}

/// A validated configuration and where its values came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Layer that last set each dotted field path.
    pub field_sources: FieldSources,
    /// Files that were found and merged, in merge order.
    pub loaded_files: Vec<PathBuf>,
}

impl ResolvedConfig {
    /// Which layer set `field`, if any.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<ConfigLayer> {
        self.field_sources.get(field).copied()
    }
}

/// Load configuration: defaults, system, user, explicit file, then
/// environment fallbacks.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any present file is unreadable or invalid,
/// the explicit file is missing, an environment fallback is malformed, or
/// the merged result fails validation.
pub fn load(options: &LoadOptions) -> ConfigResult<ResolvedConfig> {
    let mut merged = parse_defaults()?;
    let mut sources = FieldSources::new();
    merge::record_leaves(&merged, "", ConfigLayer::Defaults, &mut sources);
    let mut loaded_files = Vec::new();

    let user_file = options
        .home_dir
        .as_ref()
        .map(|home| home.join(".sitekit").join("config.toml"));

    for (layer, path) in [
        (ConfigLayer::System, options.system_file.as_ref()),
        (ConfigLayer::User, user_file.as_ref()),
    ] {
        let Some(path) = path else { continue };
        if let Some(overlay) = try_load_file(path)? {
            debug!(path = %path.display(), %layer, "merging config layer");
            merge::deep_merge_tracking(&mut merged, &overlay, "", layer, &mut sources);
            loaded_files.push(path.clone());
        }
    }

    if let Some(path) = &options.explicit_file {
        let overlay = read_toml(path)?;
        debug!(path = %path.display(), "merging explicit config file");
        merge::deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            ConfigLayer::Explicit,
            &mut sources,
        );
        loaded_files.push(path.clone());
    }

    let applied = env::apply_env_fallbacks(&mut merged, &mut sources, &options.env_vars)?;

    let config: Config = merged.try_into().map_err(|e| ConfigError::ParseError {
        path: "<merged>".to_owned(),
        source: e,
    })?;
    validate::validate(&config)?;

    info!(
        files = loaded_files.len(),
        env_fallbacks = applied,
        "configuration loaded"
    );

    Ok(ResolvedConfig {
        config,
        field_sources: sources,
        loaded_files,
    })
}

/// Load a single file over the embedded defaults.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed or
/// validated.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let mut merged = parse_defaults()?;
    let overlay = read_toml(path)?;
    let mut sources = FieldSources::new();
    merge::deep_merge_tracking(&mut merged, &overlay, "", ConfigLayer::Explicit, &mut sources);

    let config: Config = merged.try_into().map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;
    validate::validate(&config)?;
    Ok(config)
}

fn parse_defaults() -> ConfigResult<toml::Value> {
    toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
        path: "<defaults>".to_owned(),
        source: e,
    })
}

/// Read a file that must exist.
fn read_toml(path: &Path) -> ConfigResult<toml::Value> {
    match try_load_file(path)? {
        Some(value) => Ok(value),
        None => Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }),
    }
}

/// Read a file, returning `None` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    // Size is checked before reading.
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                metadata.len()
            ),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    toml::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
}
