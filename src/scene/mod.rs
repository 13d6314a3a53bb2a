pub mod camera;
#[allow(clippy::module_inception)]
pub mod scene;
