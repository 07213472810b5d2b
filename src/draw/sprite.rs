use std::rc::Rc;

use bytemuck::Zeroable;
use glam::{Mat4, Vec2, Vec4};

use crate::draw::ALPHA_OVER;
use crate::error::RenderError;
use crate::renderer::device::{
    BindingSlot, BufferHandle, BufferKind, PipelineDescriptor, PipelineHandle, RenderDevice,
    SharedRecorder, TextureHandle, TextureProvider,
};
use crate::renderer::mapped::{MappedBuffer, UniformBlock};
use crate::renderer::session::DrawSession;
use crate::renderer::uniforms::SpriteUniform;
use crate::renderer::vertex::SpriteVertex;

const SPRITE_SHADER: &str = include_str!("../shaders/sprite.wgsl");
const SPRITE_BINDINGS: &[BindingSlot] = &[BindingSlot::Uniform, BindingSlot::Texture];
const VERTEX_COUNT: usize = 4;

/// Pipeline, screen projection and draw session shared by every sprite.
pub struct SpriteCommon {
    device: Rc<dyn RenderDevice>,
    textures: Rc<dyn TextureProvider>,
    pipeline: PipelineHandle,
    projection: Mat4,
    session: DrawSession,
}

impl SpriteCommon {
    pub fn static_initialize(
        device: Rc<dyn RenderDevice>,
        textures: Rc<dyn TextureProvider>,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Result<Rc<Self>, RenderError> {
        let pipeline = device.create_pipeline(&Self::pipeline_descriptor())?;
        log::info!(
            "Sprite pipeline initialized for a {}x{} viewport",
            viewport_width,
            viewport_height
        );
        Ok(Rc::new(Self {
            device,
            textures,
            pipeline,
            projection: Self::screen_projection(viewport_width, viewport_height),
            session: DrawSession::new("Sprite"),
        }))
    }

    /// Alpha blended, depth always passes, no culling, triangle strip.
    pub fn pipeline_descriptor() -> PipelineDescriptor<'static> {
        PipelineDescriptor {
            label: "Sprite Pipeline",
            shader: SPRITE_SHADER,
            vertex_layout: SpriteVertex::layout(),
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: None,
            blend: ALPHA_OVER,
            depth_compare: wgpu::CompareFunction::Always,
            depth_write: true,
            bindings: SPRITE_BINDINGS,
        }
    }

    /// Maps (0, 0) to the top-left and (width, height) to the bottom-right.
    pub fn screen_projection(viewport_width: u32, viewport_height: u32) -> Mat4 {
        Mat4::orthographic_lh(
            0.0,
            viewport_width as f32,
            viewport_height as f32,
            0.0,
            0.0,
            1.0,
        )
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn pipeline(&self) -> PipelineHandle {
        self.pipeline
    }

    pub fn pre_draw(&self, recorder: &SharedRecorder) {
        self.session.begin(Rc::clone(recorder));
        self.session
            .with_recorder(|recorder| recorder.set_pipeline(self.pipeline));
    }

    pub fn post_draw(&self) {
        self.session.end();
    }

    pub fn is_drawing(&self) -> bool {
        self.session.is_active()
    }
}

/// Defaulted parameters of [`Sprite::create`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteOptions {
    pub color: Vec4,
    pub anchor_point: Vec2,
    pub is_flip_x: bool,
    pub is_flip_y: bool,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            anchor_point: Vec2::ZERO,
            is_flip_x: false,
            is_flip_y: false,
        }
    }
}

/// A textured, tinted quad in screen space.
///
/// Every geometry setter rewrites the vertex buffer immediately. Color and
/// the world matrix are uploaded by [`Sprite::draw`].
pub struct Sprite {
    common: Rc<SpriteCommon>,
    texture: TextureHandle,
    texture_dims: Vec2,
    position: Vec2,
    size: Vec2,
    rotation: f32,
    anchor_point: Vec2,
    is_flip_x: bool,
    is_flip_y: bool,
    color: Vec4,
    tex_base: Vec2,
    tex_size: Vec2,
    vertices: [SpriteVertex; VERTEX_COUNT],
    vertex_buffer: MappedBuffer,
    uniform: UniformBlock<SpriteUniform>,
}

impl Sprite {
    /// Size and texture rectangle default to the texture's native pixel size.
    pub fn create(
        common: &Rc<SpriteCommon>,
        texture: TextureHandle,
        position: Vec2,
        options: SpriteOptions,
    ) -> Result<Self, RenderError> {
        let texture_dims = resolve_texture_size(common.textures.as_ref(), texture)?;

        let vertex_buffer = MappedBuffer::new(
            &common.device,
            "SpriteVertexBuffer",
            (std::mem::size_of::<SpriteVertex>() * VERTEX_COUNT) as u64,
            BufferKind::Vertex,
        )?;
        let uniform = UniformBlock::new(&common.device, "SpriteUniform")?;

        let mut sprite = Self {
            common: Rc::clone(common),
            texture,
            texture_dims,
            position,
            size: texture_dims,
            rotation: 0.0,
            anchor_point: options.anchor_point,
            is_flip_x: options.is_flip_x,
            is_flip_y: options.is_flip_y,
            color: options.color,
            tex_base: Vec2::ZERO,
            tex_size: texture_dims,
            vertices: [SpriteVertex::zeroed(); VERTEX_COUNT],
            vertex_buffer,
            uniform,
        };
        sprite.transfer_vertices();
        log::debug!("Created sprite for texture {:?} at {}", texture, position);
        Ok(sprite)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.transfer_vertices();
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
        self.transfer_vertices();
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.transfer_vertices();
    }

    pub fn set_anchor_point(&mut self, anchor_point: Vec2) {
        self.anchor_point = anchor_point;
        self.transfer_vertices();
    }

    pub fn set_is_flip_x(&mut self, is_flip_x: bool) {
        self.is_flip_x = is_flip_x;
        self.transfer_vertices();
    }

    pub fn set_is_flip_y(&mut self, is_flip_y: bool) {
        self.is_flip_y = is_flip_y;
        self.transfer_vertices();
    }

    /// Sub-rectangle of the texture in texels.
    pub fn set_texture_rect(&mut self, tex_base: Vec2, tex_size: Vec2) {
        self.tex_base = tex_base;
        self.tex_size = tex_size;
        self.transfer_vertices();
    }

    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    /// Switches texture; UVs are renormalized against the new texture's size.
    pub fn set_texture_handle(&mut self, texture: TextureHandle) -> Result<(), RenderError> {
        self.texture_dims = resolve_texture_size(self.common.textures.as_ref(), texture)?;
        self.texture = texture;
        self.transfer_vertices();
        Ok(())
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn anchor_point(&self) -> Vec2 {
        self.anchor_point
    }

    pub fn is_flip_x(&self) -> bool {
        self.is_flip_x
    }

    pub fn is_flip_y(&self) -> bool {
        self.is_flip_y
    }

    pub fn color(&self) -> Vec4 {
        self.color
    }

    pub fn texture_base(&self) -> Vec2 {
        self.tex_base
    }

    pub fn texture_size(&self) -> Vec2 {
        self.tex_size
    }

    pub fn texture_handle(&self) -> TextureHandle {
        self.texture
    }

    /// Corners in LB, LT, RB, RT order, as last written to the vertex buffer.
    pub fn vertices(&self) -> &[SpriteVertex; VERTEX_COUNT] {
        &self.vertices
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer.handle()
    }

    pub fn uniform_buffer(&self) -> BufferHandle {
        self.uniform.handle()
    }

    /// Projection * translate(position) * rotate_z(rotation).
    pub fn transform(&self) -> Mat4 {
        let mat_world = Mat4::from_translation(self.position.extend(0.0))
            * Mat4::from_rotation_z(self.rotation);
        self.common.projection * mat_world
    }

    /// Panics unless a sprite draw session is open.
    pub fn draw(&self) {
        let common = &self.common;
        common.session.with_recorder(|recorder| {
            self.uniform
                .write(&SpriteUniform::new(self.color, self.transform()));
            recorder.set_vertex_buffer(self.vertex_buffer.handle());
            recorder.set_uniform_block(0, self.uniform.handle());
            common.textures.bind_texture(recorder, 1, self.texture);
            recorder.draw(VERTEX_COUNT as u32);
        });
    }

    fn transfer_vertices(&mut self) {
        let mut left = (0.0 - self.anchor_point.x) * self.size.x;
        let mut right = (1.0 - self.anchor_point.x) * self.size.x;
        let mut top = (0.0 - self.anchor_point.y) * self.size.y;
        let mut bottom = (1.0 - self.anchor_point.y) * self.size.y;
        if self.is_flip_x {
            left = -left;
            right = -right;
        }
        if self.is_flip_y {
            top = -top;
            bottom = -bottom;
        }

        let tex_left = self.tex_base.x / self.texture_dims.x;
        let tex_right = (self.tex_base.x + self.tex_size.x) / self.texture_dims.x;
        let tex_top = self.tex_base.y / self.texture_dims.y;
        let tex_bottom = (self.tex_base.y + self.tex_size.y) / self.texture_dims.y;

        self.vertices = [
            SpriteVertex { pos: [left, bottom, 0.0], uv: [tex_left, tex_bottom] },
            SpriteVertex { pos: [left, top, 0.0], uv: [tex_left, tex_top] },
            SpriteVertex { pos: [right, bottom, 0.0], uv: [tex_right, tex_bottom] },
            SpriteVertex { pos: [right, top, 0.0], uv: [tex_right, tex_top] },
        ];
        self.vertex_buffer.write(&self.vertices);
    }
}

fn resolve_texture_size(
    textures: &dyn TextureProvider,
    texture: TextureHandle,
) -> Result<Vec2, RenderError> {
    textures
        .texture_size(texture)
        .map(|(w, h)| Vec2::new(w as f32, h as f32))
        .ok_or(RenderError::UnknownTexture(texture.index()))
}
