//! CPU-only backend: buffers are byte vectors and draw sessions append to a
//! command log. Used to exercise the draw objects without a GPU.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use bytemuck::Pod;

use crate::error::RenderError;
use crate::renderer::device::{
    BindingSlot, BufferDescriptor, BufferHandle, BufferKind, DrawRecorder, PipelineDescriptor,
    PipelineHandle, RenderDevice, SharedRecorder, TextureHandle, TextureProvider,
};
use crate::renderer::handle::SlotTable;

const DEFAULT_UNIFORM_ALIGNMENT: u64 = 256;

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineRecord {
    pub label: String,
    pub topology: wgpu::PrimitiveTopology,
    pub front_face: wgpu::FrontFace,
    pub cull_mode: Option<wgpu::Face>,
    pub blend: wgpu::BlendState,
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write: bool,
    pub bindings: Vec<BindingSlot>,
    pub vertex_stride: u64,
}

struct HeadlessBuffer {
    kind: BufferKind,
    bytes: Vec<u8>,
}

pub struct HeadlessDevice {
    buffers: RefCell<SlotTable<HeadlessBuffer>>,
    pipelines: RefCell<Vec<PipelineRecord>>,
    fail_allocations: Cell<bool>,
    uniform_alignment: u64,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            buffers: RefCell::new(SlotTable::new()),
            pipelines: RefCell::new(Vec::new()),
            fail_allocations: Cell::new(false),
            uniform_alignment: DEFAULT_UNIFORM_ALIGNMENT,
        }
    }

    /// Makes every later `create_buffer` call fail, as an exhausted device would.
    pub fn set_fail_allocations(&self, fail: bool) {
        self.fail_allocations.set(fail);
    }

    pub fn buffer_bytes(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.buffers
            .borrow()
            .get(buffer.index())
            .map(|buf| buf.bytes.clone())
    }

    pub fn buffer_kind(&self, buffer: BufferHandle) -> Option<BufferKind> {
        self.buffers.borrow().get(buffer.index()).map(|buf| buf.kind)
    }

    /// Reads `count` values of `T` from the start of a live buffer.
    pub fn read<T: Pod>(&self, buffer: BufferHandle, count: usize) -> Option<Vec<T>> {
        let bytes = self.buffer_bytes(buffer)?;
        let stride = std::mem::size_of::<T>();
        if bytes.len() < stride * count {
            return None;
        }
        Some(
            bytes[..stride * count]
                .chunks_exact(stride)
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        )
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.borrow().live_count()
    }

    /// Slots ever handed out; released slots are reused before this grows.
    pub fn buffer_slot_count(&self) -> usize {
        self.buffers.borrow().capacity()
    }

    pub fn pipeline(&self, pipeline: PipelineHandle) -> Option<PipelineRecord> {
        self.pipelines.borrow().get(pipeline.index()).cloned()
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_buffer(&self, desc: &BufferDescriptor<'_>) -> Result<BufferHandle, RenderError> {
        if self.fail_allocations.get() {
            return Err(RenderError::allocation(desc.label, "headless allocation disabled"));
        }
        let index = self.buffers.borrow_mut().insert(HeadlessBuffer {
            kind: desc.kind,
            bytes: vec![0; desc.size as usize],
        });
        Ok(BufferHandle::new(index))
    }

    fn write_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        let mut buffers = self.buffers.borrow_mut();
        let Some(target) = buffers.get_mut(buffer.index()) else {
            panic!("write to released or unknown buffer {buffer:?}");
        };
        let start = offset as usize;
        target.bytes[start..start + data.len()].copy_from_slice(data);
    }

    fn destroy_buffer(&self, buffer: BufferHandle) {
        self.buffers.borrow_mut().remove(buffer.index());
    }

    fn create_pipeline(
        &self,
        desc: &PipelineDescriptor<'_>,
    ) -> Result<PipelineHandle, RenderError> {
        let mut pipelines = self.pipelines.borrow_mut();
        pipelines.push(PipelineRecord {
            label: desc.label.to_string(),
            topology: desc.topology,
            front_face: desc.front_face,
            cull_mode: desc.cull_mode,
            blend: desc.blend,
            depth_compare: desc.depth_compare,
            depth_write: desc.depth_write,
            bindings: desc.bindings.to_vec(),
            vertex_stride: desc.vertex_layout.array_stride,
        });
        Ok(PipelineHandle::new(pipelines.len() - 1))
    }

    fn uniform_alignment(&self) -> u64 {
        self.uniform_alignment
    }
}

/// Texture table holding sizes only.
#[derive(Default)]
pub struct HeadlessTextures {
    sizes: RefCell<Vec<(u32, u32)>>,
}

impl HeadlessTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, width: u32, height: u32) -> TextureHandle {
        let mut sizes = self.sizes.borrow_mut();
        sizes.push((width, height));
        TextureHandle::new(sizes.len() - 1)
    }
}

impl TextureProvider for HeadlessTextures {
    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.sizes.borrow().get(texture.index()).copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCommand {
    SetPipeline(PipelineHandle),
    SetVertexBuffer(BufferHandle),
    SetIndexBuffer(BufferHandle, wgpu::IndexFormat),
    SetUniformBlock { slot: u32, buffer: BufferHandle },
    SetTexture { slot: u32, texture: TextureHandle },
    Draw { vertex_count: u32 },
    DrawIndexed { index_count: u32 },
}

pub type CommandLog = Rc<RefCell<Vec<DrawCommand>>>;

pub struct RecordingRecorder {
    log: CommandLog,
}

impl RecordingRecorder {
    pub fn new(log: CommandLog) -> Self {
        Self { log }
    }

    /// A recorder ready to hand to `pre_draw`, plus the log it writes to.
    pub fn shared() -> (SharedRecorder, CommandLog) {
        let log: CommandLog = Rc::new(RefCell::new(Vec::new()));
        let recorder: SharedRecorder = Rc::new(RefCell::new(Self::new(Rc::clone(&log))));
        (recorder, log)
    }

    fn push(&mut self, command: DrawCommand) {
        self.log.borrow_mut().push(command);
    }
}

impl DrawRecorder for RecordingRecorder {
    fn set_pipeline(&mut self, pipeline: PipelineHandle) {
        self.push(DrawCommand::SetPipeline(pipeline));
    }

    fn set_vertex_buffer(&mut self, buffer: BufferHandle) {
        self.push(DrawCommand::SetVertexBuffer(buffer));
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: wgpu::IndexFormat) {
        self.push(DrawCommand::SetIndexBuffer(buffer, format));
    }

    fn set_uniform_block(&mut self, slot: u32, buffer: BufferHandle) {
        self.push(DrawCommand::SetUniformBlock { slot, buffer });
    }

    fn set_texture(&mut self, slot: u32, texture: TextureHandle) {
        self.push(DrawCommand::SetTexture { slot, texture });
    }

    fn draw(&mut self, vertex_count: u32) {
        self.push(DrawCommand::Draw { vertex_count });
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.push(DrawCommand::DrawIndexed { index_count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_buffers_stop_counting() {
        let device = HeadlessDevice::new();
        let a = device
            .create_buffer(&BufferDescriptor {
                label: "A",
                size: 16,
                kind: BufferKind::Vertex,
            })
            .unwrap();
        assert_eq!(device.live_buffer_count(), 1);
        device.destroy_buffer(a);
        assert_eq!(device.live_buffer_count(), 0);
        assert!(device.buffer_bytes(a).is_none());
    }

    #[test]
    fn released_slot_is_handed_out_again() {
        let device = HeadlessDevice::new();
        let desc = BufferDescriptor {
            label: "C",
            size: 4,
            kind: BufferKind::Vertex,
        };
        let a = device.create_buffer(&desc).unwrap();
        let b = device.create_buffer(&desc).unwrap();
        device.destroy_buffer(a);

        let c = device.create_buffer(&desc).unwrap();
        assert_eq!(c, a);
        assert_ne!(c, b);
        assert_eq!(device.buffer_slot_count(), 2);
        assert_eq!(device.buffer_bytes(c), Some(vec![0; 4]));
    }

    #[test]
    fn writes_are_visible_immediately() {
        let device = HeadlessDevice::new();
        let buffer = device
            .create_buffer(&BufferDescriptor {
                label: "B",
                size: 8,
                kind: BufferKind::Uniform,
            })
            .unwrap();
        device.write_buffer(buffer, 0, bytemuck::cast_slice(&[1.5f32, 2.5]));
        assert_eq!(device.read::<f32>(buffer, 2), Some(vec![1.5, 2.5]));
    }

    #[test]
    fn failing_allocation_reports_label() {
        let device = HeadlessDevice::new();
        device.set_fail_allocations(true);
        let err = device
            .create_buffer(&BufferDescriptor {
                label: "Doomed",
                size: 4,
                kind: BufferKind::Index,
            })
            .unwrap_err();
        assert!(matches!(err, RenderError::Allocation { ref label, .. } if label == "Doomed"));
    }
}
