use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use serde::{Deserialize, Serialize};

use crate::hover::ray::Ray;

/// Camera placement and lens settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the origin along +Z.
    pub distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_deg: 60.0,
            near: 0.1,
            far: 2000.0,
            distance: 200.0,
        }
    }
}

/// Perspective camera looking from `position` towards `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    pub fn new(settings: &CameraSettings, aspect: f32) -> Self {
        Self {
            fov_y: settings.fov_deg.to_radians(),
            aspect,
            near: settings.near,
            far: settings.far,
            position: Vec3::new(0.0, 0.0, settings.distance),
            target: Vec3::ZERO,
        }
    }

    /// Updates the aspect ratio from a viewport size. A zero height keeps the
    /// previous aspect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ray from the camera through a point in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let far = inverse * ndc.extend(1.0).extend(1.0);
        let far = far.xyz() / far.w;
        Ray::new(self.position, far - self.position)
    }

    /// Projects a world point to normalized device coordinates. Points behind
    /// the camera have no projection.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.view_projection() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some(clip.xy() / clip.w)
    }
}
