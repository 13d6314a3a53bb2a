use glam::Vec2;

use crate::scene::scene::{Renderer, StarScene};

/// Pointer position in normalized device coordinates (`[-1, 1]` on both axes,
/// +Y up).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl PointerState {
    /// Normalizes a client-space pixel position against the viewport size.
    pub fn from_client(client_x: f64, client_y: f64, width: u32, height: u32) -> Self {
        let w = f64::from(width.max(1));
        let h = f64::from(height.max(1));
        Self {
            x: ((client_x / w) * 2.0 - 1.0) as f32,
            y: (-(client_y / h) * 2.0 + 1.0) as f32,
        }
    }

    pub fn ndc(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Pixel position of this pointer in a viewport of the given size.
    pub fn to_client(&self, width: u32, height: u32) -> (f64, f64) {
        let left = (f64::from(self.x) + 1.0) * f64::from(width) / 2.0;
        let top = (-f64::from(self.y) + 1.0) * f64::from(height) / 2.0;
        (left, top)
    }
}

/// The star currently under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub index: usize,
    pub label: String,
    /// Distance from the camera along the pick ray.
    pub distance: f32,
}

/// Finds the nearest star under the pointer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HoverDetector;

impl HoverDetector {
    /// Casts a ray from the camera through `pointer`.
    ///
    /// The closest hit wins; at equal distance the earlier-added star wins.
    pub fn detect<R: Renderer>(&self, scene: &StarScene<R>, pointer: PointerState) -> Option<Hover> {
        let ray = scene.camera().ray_from_ndc(pointer.ndc());

        let mut best: Option<(usize, f32)> = None;
        for (index, star) in scene.stars().iter().enumerate() {
            let Some(t) = ray.intersect_sphere(star.center(), star.radius) else {
                continue;
            };
            // strict comparison keeps the lower index on ties
            if best.map_or(true, |(_, bt)| t < bt) {
                best = Some((index, t));
            }
        }

        let (index, distance) = best?;
        Some(Hover {
            index,
            label: scene.stars()[index].label.clone(),
            distance,
        })
    }
}

/// Tooltip overlay state, in viewport pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tooltip {
    pub text: String,
    pub left_px: f64,
    pub top_px: f64,
    pub visible: bool,
}

impl Tooltip {
    pub fn update(&mut self, hover: Option<&Hover>, pointer: PointerState, viewport: (u32, u32)) {
        match hover {
            Some(hover) => {
                let (left, top) = pointer.to_client(viewport.0, viewport.1);
                self.text = format!("Star: {}", hover.label);
                self.left_px = left;
                self.top_px = top;
                self.visible = true;
            }
            None => self.visible = false,
        }
    }
}
