use glam::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction; zero when built from a degenerate vector.
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Distance along the ray to the first hit on a sphere, if any.
    ///
    /// An origin inside the sphere reports the exit distance. Hits behind the
    /// origin are ignored.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        if self.dir == Vec3::ZERO {
            return None;
        }
        let oc = self.origin - center;
        let b = oc.dot(self.dir);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let near = -b - sqrt_disc;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + sqrt_disc;
        (far >= 0.0).then_some(far)
    }
}
