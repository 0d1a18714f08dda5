use std::fmt;

use runtime::frame::DEFAULT_DT_CAP_S;
use scene::animator::{AnimatorOptions, DEFAULT_ENTITIES_PER_PATH, DEFAULT_SPEED_MPS, MIN_SPEED_MPS};
use scene::builder::{BuildOptions, DEFAULT_HALO_SCALE};
use scene::solid::SolidOptions;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "invalid scene config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
        }
    }
}

/// Tunables for one facility scene. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub entities_per_path: usize,
    pub vehicle_speed_mps: f64,
    pub dt_cap_s: f64,
    pub halo_scale: f64,
    pub vehicle_altitude_m: f64,
    pub path_altitude_m: f64,
    pub conveyor_altitude_m: f64,
    /// Prefix of every host source, layer and marker id.
    pub id_prefix: String,
    pub enable_3d: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            entities_per_path: DEFAULT_ENTITIES_PER_PATH,
            vehicle_speed_mps: DEFAULT_SPEED_MPS,
            dt_cap_s: DEFAULT_DT_CAP_S,
            halo_scale: DEFAULT_HALO_SCALE,
            vehicle_altitude_m: 1.5,
            path_altitude_m: 0.8,
            conveyor_altitude_m: 1.2,
            id_prefix: "facility".to_string(),
            enable_3d: true,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_json::from_str(payload).map_err(ConfigError::Parse)?;
        Ok(config.normalized())
    }

    /// Replace out-of-range values with usable ones.
    pub fn normalized(mut self) -> Self {
        let defaults = SceneConfig::default();
        self.vehicle_speed_mps = if self.vehicle_speed_mps.is_finite() {
            self.vehicle_speed_mps.max(MIN_SPEED_MPS)
        } else {
            defaults.vehicle_speed_mps
        };
        if !self.dt_cap_s.is_finite() || self.dt_cap_s < 0.0 {
            self.dt_cap_s = defaults.dt_cap_s;
        }
        if !self.halo_scale.is_finite() || self.halo_scale <= 0.0 {
            self.halo_scale = defaults.halo_scale;
        }
        for (value, default) in [
            (&mut self.vehicle_altitude_m, defaults.vehicle_altitude_m),
            (&mut self.path_altitude_m, defaults.path_altitude_m),
            (&mut self.conveyor_altitude_m, defaults.conveyor_altitude_m),
        ] {
            if !value.is_finite() {
                *value = default;
            }
        }
        if self.id_prefix.trim().is_empty() {
            self.id_prefix = defaults.id_prefix;
        }
        self
    }

    pub fn animator_options(&self) -> AnimatorOptions {
        AnimatorOptions {
            entities_per_path: self.entities_per_path,
            default_speed_mps: self.vehicle_speed_mps,
            dt_cap_s: self.dt_cap_s,
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            halo_scale: self.halo_scale,
        }
    }

    pub fn solid_options(&self) -> SolidOptions {
        SolidOptions {
            halo_scale: self.halo_scale,
            conveyor_altitude_m: self.conveyor_altitude_m,
            path_altitude_m: self.path_altitude_m,
        }
    }
}
