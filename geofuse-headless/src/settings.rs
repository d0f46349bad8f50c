use std::time::Duration;

use color_eyre::{
    Result,
    eyre::{WrapErr, ensure},
};
use config::Config;
use geofuse_common::{GeoCoord, GeodeticRect, Size};
use geofuse_sync::{SyncSettings, data::settings::environment};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ObjectSettings {
    pub name: String,
    pub footprint: GeodeticRect,
    /// Uniform scale of the mesh so it is visible at planet scale.
    pub scale: f64,
    /// Offset of the mesh along its group's outward axis, metres.
    pub lift: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub height: f64,
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            height: 200_000.0,
            heading: 0.0,
            pitch: -60.0,
            roll: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlyToSettings {
    /// Latitude offset of the destination from the first object's centre, degrees.
    pub latitude_offset: f64,
    pub duration_secs: f64,
    pub view: ViewSettings,
}

impl Default for FlyToSettings {
    fn default() -> Self {
        Self {
            latitude_offset: -1.0,
            duration_secs: 3.0,
            view: ViewSettings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeadlessSettings {
    pub sync: SyncSettings,
    pub ticks: u64,
    pub frame_rate: f64,
    pub viewport: Size<u32>,
    pub fov_degrees: f64,
    pub start: GeoCoord,
    pub start_height: f64,
    pub fly_to: FlyToSettings,
    pub objects: Vec<ObjectSettings>,
}

impl Default for HeadlessSettings {
    fn default() -> Self {
        Self {
            sync: SyncSettings::default(),
            ticks: 240,
            frame_rate: 60.0,
            viewport: (1920, 1080).into(),
            fov_degrees: 60.0,
            start: GeoCoord::new(0.0, 0.0),
            start_height: 20_000_000.0,
            fly_to: FlyToSettings::default(),
            objects: Vec::new(),
        }
    }
}

impl HeadlessSettings {
    pub fn load(file_name: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(config::File::with_name(file_name).required(false))
            .add_source(environment())
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn frame_interval(&self) -> Result<Duration> {
        ensure!(
            self.frame_rate.is_finite() && self.frame_rate > 0.0,
            "frame_rate must be a positive number of frames per second, got {}",
            self.frame_rate
        );
        Duration::try_from_secs_f64(self.frame_rate.recip())
            .wrap_err_with(|| format!("frame_rate {} is out of range", self.frame_rate))
    }
}

impl FlyToSettings {
    pub fn duration(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.duration_secs)
            .wrap_err_with(|| format!("fly_to.duration_secs {} is invalid", self.duration_secs))
    }
}
