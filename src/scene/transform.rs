use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::error::RenderError;
use crate::renderer::device::{BufferHandle, RenderDevice};
use crate::renderer::mapped::UniformBlock;
use crate::renderer::uniforms::WorldTransformUniform;

/// Scale, Euler rotation (radians) and translation of one object, with the
/// resulting world matrix kept in a uniform block.
///
/// Fields can be changed freely; the matrix only follows after
/// [`WorldTransform::update_matrix`].
pub struct WorldTransform {
    pub scale: Vec3,
    pub rotation: Vec3,
    pub translation: Vec3,
    mat_world: Mat4,
    block: Option<UniformBlock<WorldTransformUniform>>,
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
            mat_world: Mat4::IDENTITY,
            block: None,
        }
    }
}

impl WorldTransform {
    pub fn new(scale: Vec3, rotation: Vec3, translation: Vec3) -> Self {
        Self {
            scale,
            rotation,
            translation,
            ..Self::default()
        }
    }

    /// Scale first, then rotate about Z, X, Y in that order, then translate.
    pub fn compose(scale: Vec3, rotation: Vec3, translation: Vec3) -> Mat4 {
        Mat4::from_translation(translation)
            * Mat4::from_rotation_y(rotation.y)
            * Mat4::from_rotation_x(rotation.x)
            * Mat4::from_rotation_z(rotation.z)
            * Mat4::from_scale(scale)
    }

    /// Allocates the uniform block and uploads the current pose.
    pub fn initialize(&mut self, device: &Rc<dyn RenderDevice>) -> Result<(), RenderError> {
        self.block = Some(UniformBlock::new(device, "WorldTransform")?);
        self.update_matrix();
        Ok(())
    }

    pub fn update_matrix(&mut self) {
        self.mat_world = Self::compose(self.scale, self.rotation, self.translation);
        if let Some(block) = &self.block {
            block.write(&WorldTransformUniform::new(self.mat_world));
        }
    }

    pub fn mat_world(&self) -> Mat4 {
        self.mat_world
    }

    pub fn is_initialized(&self) -> bool {
        self.block.is_some()
    }

    pub fn uniform_buffer(&self) -> Option<BufferHandle> {
        self.block.as_ref().map(UniformBlock::handle)
    }
}
