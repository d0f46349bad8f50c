use color_eyre::Result;
use config::{Config, Environment};
use serde::Deserialize;

use crate::common::convention::FrameConvention;

pub const ENV_PREFIX: &str = "GEOFUSE";

/// `GEOFUSE_` followed by the key path, nested keys joined with `__`:
/// `GEOFUSE_ORIENTER__NORMAL_SAMPLE_HEIGHT=10`.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub near: f64,
    pub far: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            near: 1.0,
            far: 10.0 * 1000.0 * 1000.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrienterSettings {
    /// Height in metres of the point sampled above a footprint centre to get
    /// its outward direction.
    pub normal_sample_height: f64,
}

impl Default for OrienterSettings {
    fn default() -> Self {
        Self {
            normal_sample_height: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub camera: CameraSettings,
    pub orienter: OrienterSettings,
    pub convention: FrameConvention,
    pub outline_footprints: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            orienter: OrienterSettings::default(),
            convention: FrameConvention::default(),
            outline_footprints: true,
        }
    }
}

impl SyncSettings {
    pub fn from_config(settings: Config) -> Result<Self> {
        let sync_settings = settings.try_deserialize()?;

        Ok(sync_settings)
    }

    /// Reads an optional settings file (any format `config` recognises by
    /// extension) overlaid with `GEOFUSE_*` environment variables.
    pub fn load(file_name: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(config::File::with_name(file_name).required(false))
            .add_source(environment())
            .build()?;

        Self::from_config(settings)
    }
}
