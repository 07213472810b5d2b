//! Seams between the draw objects and whatever actually owns the GPU.
//!
//! Sprites, models and transforms only ever talk to a [`RenderDevice`] (buffer
//! and pipeline allocation), a [`DrawRecorder`] (the command stream of the
//! current draw session) and a [`TextureProvider`] (externally owned textures).
//! The wgpu backend implements all three for real rendering; the headless
//! backend implements them on the CPU so the draw objects can be exercised
//! without an adapter.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::RenderError;
use crate::renderer::handle::Handle;

pub enum GpuBuffer {}
pub enum GpuPipeline {}
pub enum GpuTexture {}

pub type BufferHandle = Handle<GpuBuffer>;
pub type PipelineHandle = Handle<GpuPipeline>;
pub type TextureHandle = Handle<GpuTexture>;

/// Command recorder shared by every session that is open on the same pass.
pub type SharedRecorder = Rc<RefCell<dyn DrawRecorder>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
}

#[derive(Clone, Copy, Debug)]
pub struct BufferDescriptor<'a> {
    pub label: &'a str,
    pub size: u64,
    pub kind: BufferKind,
}

/// One entry of a pipeline's binding layout. Entry `n` is bind group `n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingSlot {
    Uniform,
    Texture,
}

/// Backend-neutral description of a fixed-function pipeline configuration.
#[derive(Clone, Debug)]
pub struct PipelineDescriptor<'a> {
    pub label: &'a str,
    pub shader: &'a str,
    pub vertex_layout: wgpu::VertexBufferLayout<'a>,
    pub topology: wgpu::PrimitiveTopology,
    pub front_face: wgpu::FrontFace,
    pub cull_mode: Option<wgpu::Face>,
    pub blend: wgpu::BlendState,
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write: bool,
    pub bindings: &'a [BindingSlot],
}

/// Buffer and pipeline allocation.
pub trait RenderDevice {
    fn create_buffer(&self, desc: &BufferDescriptor<'_>) -> Result<BufferHandle, RenderError>;

    /// Writes land directly in the buffer; there is no map/unmap step.
    fn write_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8]);

    fn destroy_buffer(&self, buffer: BufferHandle);

    fn create_pipeline(&self, desc: &PipelineDescriptor<'_>)
        -> Result<PipelineHandle, RenderError>;

    /// Minimum size/offset granularity for uniform blocks.
    fn uniform_alignment(&self) -> u64;
}

/// The command stream of an open draw session.
pub trait DrawRecorder {
    fn set_pipeline(&mut self, pipeline: PipelineHandle);
    fn set_vertex_buffer(&mut self, buffer: BufferHandle);
    fn set_index_buffer(&mut self, buffer: BufferHandle, format: wgpu::IndexFormat);
    fn set_uniform_block(&mut self, slot: u32, buffer: BufferHandle);
    fn set_texture(&mut self, slot: u32, texture: TextureHandle);
    fn draw(&mut self, vertex_count: u32);
    fn draw_indexed(&mut self, index_count: u32);
}

/// Externally owned textures, addressed by handle.
pub trait TextureProvider {
    /// Native pixel size, or `None` for an unknown handle.
    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)>;

    fn bind_texture(&self, recorder: &mut dyn DrawRecorder, slot: u32, texture: TextureHandle) {
        recorder.set_texture(slot, texture);
    }
}
