pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod coords;
pub mod data;
pub mod frame;
pub mod hover;
pub mod scene;
pub mod tasks;
pub mod text;

use serde::{Deserialize, Serialize};

use crate::coords::convert::equatorial_to_cartesian;

/// One star as delivered by the backend, after defaults have been applied.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StarRecord {
    pub source_id: String,
    /// Right ascension in degrees.
    pub ra: f64,
    /// Declination in degrees.
    pub dec: f64,
    pub magnitude: f64,
    pub distance: f64,
}

impl StarRecord {
    /// Scene position of this star (see [`equatorial_to_cartesian`]).
    pub fn position(&self) -> [f32; 3] {
        equatorial_to_cartesian(self.ra, self.dec, self.magnitude)
    }

    pub fn label(&self) -> String {
        format!("ID: {}, Mag: {}", self.source_id, self.magnitude)
    }
}
