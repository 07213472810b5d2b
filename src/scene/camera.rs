use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::error::RenderError;
use crate::renderer::device::{BufferHandle, RenderDevice};
use crate::renderer::mapped::UniformBlock;
use crate::renderer::uniforms::ViewProjectionUniform;

/// Camera parameters plus the view and projection matrices, kept in a
/// uniform block for [`crate::draw::Model::draw`].
pub struct ViewProjection {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_angle_y: f32,
    pub aspect_ratio: f32,
    pub near_z: f32,
    pub far_z: f32,
    mat_view: Mat4,
    mat_projection: Mat4,
    block: Option<UniformBlock<ViewProjectionUniform>>,
}

impl ViewProjection {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, -50.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_angle_y: 45f32.to_radians(),
            aspect_ratio: viewport_width as f32 / viewport_height.max(1) as f32,
            near_z: 0.1,
            far_z: 1000.0,
            mat_view: Mat4::IDENTITY,
            mat_projection: Mat4::IDENTITY,
            block: None,
        }
    }

    fn view(&self) -> Mat4 {
        Mat4::look_at_lh(self.eye, self.target, self.up)
    }

    fn proj(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_angle_y, self.aspect_ratio, self.near_z, self.far_z)
    }

    pub fn initialize(&mut self, device: &Rc<dyn RenderDevice>) -> Result<(), RenderError> {
        self.block = Some(UniformBlock::new(device, "ViewProjection")?);
        self.update_matrix();
        Ok(())
    }

    pub fn update_matrix(&mut self) {
        self.mat_view = self.view();
        self.mat_projection = self.proj();
        if let Some(block) = &self.block {
            block.write(&ViewProjectionUniform::from_matrices(
                self.mat_view,
                self.mat_projection,
                self.eye,
            ));
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        self.mat_projection * self.mat_view
    }

    pub fn is_initialized(&self) -> bool {
        self.block.is_some()
    }

    pub fn uniform_buffer(&self) -> Option<BufferHandle> {
        self.block.as_ref().map(UniformBlock::handle)
    }
}
