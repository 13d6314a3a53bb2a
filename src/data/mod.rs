//! Decoding of backend star payloads into [`StarRecord`]s.
//!
//! Missing optional fields are filled from a [`DecodePolicy`] instead of
//! inline fallbacks so the defaults are visible and testable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::StarRecord;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no stars found for the given planet")]
    NoStars,
}

/// Defaults applied to star fields the backend leaves out (or sends as null).
///
/// An empty-string `source_id` counts as absent and gets `unknown_source_id`,
/// while a magnitude or distance of `0.0` is a real value and is kept.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecodePolicy {
    pub unknown_source_id: String,
    pub default_magnitude: f64,
    pub default_distance: f64,
}

impl Default for DecodePolicy {
    fn default() -> Self {
        Self {
            unknown_source_id: "Unknown".to_string(),
            default_magnitude: 100.0,
            default_distance: 100.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireStar {
    #[serde(default)]
    source_id: Option<Value>,
    ra: f64,
    dec: f64,
    #[serde(default)]
    magnitude: Option<f64>,
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WirePayload {
    #[serde(default)]
    stars: Option<Vec<WireStar>>,
    #[serde(default)]
    exoplanet_data: Vec<PlanetRecord>,
}

/// Host planet entry the backend returns next to the star list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanetRecord {
    pub pl_name: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ra: Option<f64>,
    #[serde(default)]
    pub dec: Option<f64>,
}

/// A validated star payload: at least one star, defaults applied.
#[derive(Clone, Debug, PartialEq)]
pub struct StarPayload {
    pub stars: Vec<StarRecord>,
    pub planets: Vec<PlanetRecord>,
}

impl DecodePolicy {
    fn apply(&self, star: WireStar) -> StarRecord {
        let source_id = match star.source_id {
            None | Some(Value::Null) => self.unknown_source_id.clone(),
            Some(Value::String(s)) if s.is_empty() => self.unknown_source_id.clone(),
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
        };
        StarRecord {
            source_id,
            ra: star.ra,
            dec: star.dec,
            magnitude: star.magnitude.unwrap_or(self.default_magnitude),
            distance: star.distance.unwrap_or(self.default_distance),
        }
    }
}

/// Decodes a `/fetch-stars` response body.
///
/// Fails with [`DataError::NoStars`] when the `stars` array is missing or empty.
pub fn decode_star_payload(body: &str, policy: &DecodePolicy) -> Result<StarPayload, DataError> {
    let wire: WirePayload = serde_json::from_str(body)?;
    let stars = match wire.stars {
        Some(stars) if !stars.is_empty() => stars,
        _ => return Err(DataError::NoStars),
    };
    Ok(StarPayload {
        stars: stars.into_iter().map(|s| policy.apply(s)).collect(),
        planets: wire.exoplanet_data,
    })
}
