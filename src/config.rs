use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::DecodePolicy;
use crate::scene::camera::CameraSettings;
use crate::text::animate::AnimationTiming;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("backend url must not be empty")]
    EmptyBackendUrl,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub backend_url: String,
    pub frame_rate: u32,
    pub star_radius: f32,
    pub camera: CameraSettings,
    pub decode: DecodePolicy,
    pub animation: AnimationTiming,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            frame_rate: 60,
            star_radius: 0.5,
            camera: CameraSettings::default(),
            decode: DecodePolicy::default(),
            animation: AnimationTiming::default(),
        }
    }
}
