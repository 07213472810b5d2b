// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Per-sprite block: tint color and the combined world * projection matrix.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct SpriteUniform {
    pub color: [f32; 4],
    pub mat: [[f32; 4]; 4],
}

impl SpriteUniform {
    pub fn new(color: Vec4, mat: Mat4) -> Self {
        Self {
            color: color.to_array(),
            mat: mat.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct WorldTransformUniform {
    pub mat_world: [[f32; 4]; 4],
}

impl WorldTransformUniform {
    pub fn new(mat_world: Mat4) -> Self {
        Self {
            mat_world: mat_world.to_cols_array_2d(),
        }
    }
}

impl Default for WorldTransformUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct ViewProjectionUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl ViewProjectionUniform {
    pub fn from_matrices(view: Mat4, projection: Mat4, camera_pos: Vec3) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            camera_pos: camera_pos.to_array(),
            _padding: 0.0,
        }
    }
}

impl Default for ViewProjectionUniform {
    fn default() -> Self {
        Self::from_matrices(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn sprite_uniform_is_80_bytes() {
        // vec4<f32> color = 16 bytes, mat4x4<f32> = 64 bytes
        assert_eq!(std::mem::size_of::<SpriteUniform>(), 80);
    }

    #[test]
    fn world_transform_uniform_is_64_bytes() {
        assert_eq!(std::mem::size_of::<WorldTransformUniform>(), 64);
    }

    #[test]
    fn view_projection_uniform_is_144_bytes() {
        // 2 * mat4x4<f32> = 128 bytes, vec3<f32> = 12 bytes, padding = 4 bytes
        assert_eq!(std::mem::size_of::<ViewProjectionUniform>(), 144);
    }

    #[test]
    fn sprite_uniform_keeps_column_major_layout() {
        let m = Mat4::from_translation(Vec3::new(3.0, 4.0, 0.0));
        let uni = SpriteUniform::new(Vec4::ONE, m);
        assert_eq!(uni.mat[3], [3.0, 4.0, 0.0, 1.0]);
    }
}
