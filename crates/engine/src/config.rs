use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::motion::Easing;

pub const CONFIG_ENV_VAR: &str = "ISO_ENGINE_CONFIG";
pub const DEFAULT_TICK_RATE: u32 = 60;
pub const DEFAULT_MOVE_SPEED: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathfindingConfig {
    /// 8-connected neighbours and the octile heuristic.
    pub diagonal: bool,
    /// Fall back to the closest reachable node when the goal is unreachable.
    pub closest: bool,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            diagonal: false,
            closest: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionConfig {
    /// Frames per second used to turn tween durations into frame counts.
    pub tick_rate: u32,
    /// Pixels per frame for movables spawned without an explicit speed.
    pub default_speed: f32,
    pub default_easing: Easing,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            default_speed: DEFAULT_MOVE_SPEED,
            default_easing: Easing::Linear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransitConfig {
    /// Re-solve toward the final destination after every arrived step.
    pub check_path_by_each_tile: bool,
    pub instant_relocation: bool,
    pub tile_width: f32,
    pub tile_height: f32,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            check_path_by_each_tile: false,
            instant_relocation: false,
            tile_width: 64.0,
            tile_height: 32.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub pathfinding: PathfindingConfig,
    pub motion: MotionConfig,
    pub transit: TransitConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read engine config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse engine config at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid engine config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
}

impl EngineConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: EngineConfig = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| {
                let path = error.path().to_string();
                ConfigError::Parse {
                    path,
                    source: error.into_inner(),
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.motion.tick_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "motion.tick_rate",
                reason: "must be greater than zero",
            });
        }
        if !self.motion.default_speed.is_finite() || self.motion.default_speed <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "motion.default_speed",
                reason: "must be a positive finite number",
            });
        }
        if !(self.transit.tile_width.is_finite() && self.transit.tile_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "transit.tile_width",
                reason: "must be a positive finite number",
            });
        }
        if !(self.transit.tile_height.is_finite() && self.transit.tile_height > 0.0) {
            return Err(ConfigError::Invalid {
                field: "transit.tile_height",
                reason: "must be a positive finite number",
            });
        }
        Ok(())
    }
}

/// Loads the config named by `ISO_ENGINE_CONFIG`, or the defaults when unset.
pub fn resolve_engine_config() -> Result<EngineConfig, ConfigError> {
    match env::var(CONFIG_ENV_VAR) {
        Ok(value) => {
            let path = PathBuf::from(value);
            let config = EngineConfig::from_path(&path)?;
            info!(path = %path.display(), "engine_config_loaded");
            Ok(config)
        }
        Err(env::VarError::NotPresent) => Ok(EngineConfig::default()),
        Err(source) => Err(ConfigError::EnvVar {
            var: CONFIG_ENV_VAR,
            source,
        }),
    }
}
