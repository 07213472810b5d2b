pub mod camera;
pub mod transform;

pub use camera::ViewProjection;
pub use transform::WorldTransform;
