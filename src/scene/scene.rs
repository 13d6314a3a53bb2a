use glam::Vec3;
use log::debug;

use crate::scene::camera::{CameraSettings, PerspectiveCamera};
use crate::StarRecord;

/// A point-like star placed in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedStar {
    pub label: String,
    pub position: [f32; 3],
    pub radius: f32,
}

impl RenderedStar {
    pub fn center(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Everything a renderer needs for one frame.
pub struct SceneView<'a> {
    pub camera: &'a PerspectiveCamera,
    pub stars: &'a [RenderedStar],
}

/// Drawing backend supplied by the host (a WebGL canvas, a GPU surface, or a
/// recorder in headless runs).
///
/// Failures inside a backend are not reported back to the scene.
pub trait Renderer {
    fn set_size(&mut self, width: u32, height: u32);
    fn render(&mut self, view: &SceneView<'_>);
}

/// Renderer that draws nothing and records what it was asked to do.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HeadlessRenderer {
    pub size: (u32, u32),
    pub frames: u64,
    pub last_star_count: usize,
}

impl Renderer for HeadlessRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn render(&mut self, view: &SceneView<'_>) {
        self.frames += 1;
        self.last_star_count = view.stars.len();
    }
}

/// Owns the camera, the renderer and the current set of rendered stars.
pub struct StarScene<R: Renderer> {
    camera: PerspectiveCamera,
    renderer: R,
    stars: Vec<RenderedStar>,
    star_radius: f32,
    viewport: (u32, u32),
}

impl<R: Renderer> StarScene<R> {
    pub fn new(
        mut renderer: R,
        settings: &CameraSettings,
        star_radius: f32,
        width: u32,
        height: u32,
    ) -> Self {
        let mut camera = PerspectiveCamera::new(settings, 1.0);
        camera.set_viewport(width, height);
        renderer.set_size(width, height);
        StarScene {
            camera,
            renderer,
            stars: Vec::new(),
            star_radius,
            viewport: (width, height),
        }
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn stars(&self) -> &[RenderedStar] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn clear(&mut self) {
        self.stars.clear();
    }

    pub fn add_star(&mut self, position: [f32; 3], label: impl Into<String>) {
        self.stars.push(RenderedStar {
            label: label.into(),
            position,
            radius: self.star_radius,
        });
    }

    /// Rebuilds the star set wholesale from backend records.
    pub fn replace_stars(&mut self, records: &[StarRecord]) {
        self.clear();
        for record in records {
            self.add_star(record.position(), record.label());
        }
        debug!("scene now holds {} stars", self.stars.len());
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.camera.set_viewport(width, height);
        self.renderer.set_size(width, height);
    }

    pub fn render(&mut self) {
        let view = SceneView {
            camera: &self.camera,
            stars: &self.stars,
        };
        self.renderer.render(&view);
    }
}
