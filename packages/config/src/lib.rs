#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard configuration.
//!
//! Configuration is a TOML document with gravity parameters for both flow
//! estimation modes, the playback cadence, the hour extraction policy, and
//! the predefined link network. Every section is optional; missing values
//! fall back to the built-in defaults. A default document describing the
//! Sendai central arcade network is embedded in the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crowd_flow_gravity::{GravityError, validate_params};
use crowd_flow_observation_models::{FlowSettings, GravityParams, HourPolicy, LinkDefinition};
use serde::Deserialize;

/// Environment variable naming a configuration file to load.
pub const CONFIG_ENV_VAR: &str = "CROWD_FLOW_CONFIG";

/// Embedded default configuration.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../default.toml");

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has the wrong shape.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A gravity parameter is out of range.
    #[error(transparent)]
    Gravity(#[from] GravityError),

    /// The playback period is zero.
    #[error("playback.period_ms must be greater than zero")]
    ZeroPlaybackPeriod,
}

/// Playback settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Milliseconds between automatic hour advances.
    pub period_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            period_ms: u64::try_from(crowd_flow_playback::DEFAULT_PERIOD.as_millis())
                .unwrap_or(1_200),
        }
    }
}

/// Time interpretation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// How the hour of day is derived from timestamps.
    #[serde(default)]
    pub hour_policy: HourPolicy,
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawConfig")]
pub struct DashboardConfig {
    /// Parameters for link-driven estimation.
    pub gravity: GravityParams,
    /// Parameters for all-pairs estimation.
    pub all_pairs: GravityParams,
    /// Playback settings.
    pub playback: PlaybackConfig,
    /// Time interpretation settings.
    pub time: TimeConfig,
    /// Predefined links for link-driven estimation.
    pub links: Vec<LinkDefinition>,
}

/// A `[gravity]` or `[all_pairs]` table. Omitted keys keep the default of
/// the mode the table configures.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct GravitySection {
    k: Option<f64>,
    n: Option<f64>,
    #[serde(alias = "minD")]
    min_distance: Option<f64>,
}

impl GravitySection {
    fn over(self, defaults: GravityParams) -> GravityParams {
        GravityParams {
            k: self.k.unwrap_or(defaults.k),
            n: self.n.unwrap_or(defaults.n),
            min_distance: self.min_distance.unwrap_or(defaults.min_distance),
        }
    }
}

/// Document shape as written; every table is optional.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    gravity: GravitySection,
    #[serde(default)]
    all_pairs: GravitySection,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    time: TimeConfig,
    #[serde(default)]
    links: Vec<LinkDefinition>,
}

impl From<RawConfig> for DashboardConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            gravity: raw.gravity.over(GravityParams::link_defaults()),
            all_pairs: raw.all_pairs.over(GravityParams::all_pairs_defaults()),
            playback: raw.playback,
            time: raw.time,
            links: raw.links,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            gravity: GravityParams::link_defaults(),
            all_pairs: GravityParams::all_pairs_defaults(),
            playback: PlaybackConfig::default(),
            time: TimeConfig::default(),
            links: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document does not parse or contains
    /// out-of-range values.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// The embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the embedded document is invalid.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
    }

    /// Loads configuration from `path`, else from the file named by
    /// [`CONFIG_ENV_VAR`], else the embedded default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the chosen file cannot be read or is
    /// invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        let Some(path) = path else {
            log::debug!("No config file given, using embedded defaults");
            return Self::embedded();
        };

        let toml_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml_str(&toml_str)?;

        log::info!(
            "Loaded config from {} ({} links, hour policy {})",
            path.display(),
            config.links.len(),
            config.time.hour_policy
        );

        Ok(config)
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_params(&self.gravity)?;
        validate_params(&self.all_pairs)?;
        if self.playback.period_ms == 0 {
            return Err(ConfigError::ZeroPlaybackPeriod);
        }
        Ok(())
    }

    /// Flow estimator settings derived from this configuration.
    #[must_use]
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            links: self.links.clone(),
            link_params: self.gravity,
            pair_params: self.all_pairs,
        }
    }

    /// Playback period as a [`Duration`].
    #[must_use]
    pub const fn playback_period(&self) -> Duration {
        Duration::from_millis(self.playback.period_ms)
    }
}
