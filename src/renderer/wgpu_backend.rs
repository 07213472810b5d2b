//! wgpu implementation of the device and recorder seams.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::RenderError;
use crate::renderer::device::{
    BindingSlot, BufferDescriptor, BufferHandle, BufferKind, DrawRecorder, PipelineDescriptor,
    PipelineHandle, RenderDevice, TextureHandle,
};
use crate::renderer::handle::SlotTable;
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::texture::TextureManager;

struct GpuBufferEntry {
    buffer: wgpu::Buffer,
    // Uniform buffers are bound through their own group.
    bind_group: Option<wgpu::BindGroup>,
}

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    buffers: RefCell<SlotTable<GpuBufferEntry>>,
    pipelines: RefCell<Vec<wgpu::RenderPipeline>>,
}

impl WgpuDevice {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
    ) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Block Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            device,
            queue,
            color_format,
            depth_format,
            uniform_layout,
            texture_layout,
            buffers: RefCell::new(SlotTable::new()),
            pipelines: RefCell::new(Vec::new()),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn texture_layout(&self) -> &wgpu::BindGroupLayout {
        &self.texture_layout
    }

    /// Runs `f` inside an error scope and blocks on the result.
    fn scoped<R>(&self, filter: wgpu::ErrorFilter, f: impl FnOnce() -> R) -> Result<R, wgpu::Error> {
        self.device.push_error_scope(filter);
        let value = f();
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }
}

impl RenderDevice for WgpuDevice {
    fn create_buffer(&self, desc: &BufferDescriptor<'_>) -> Result<BufferHandle, RenderError> {
        let usage = match desc.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_DST;

        let buffer = self
            .scoped(wgpu::ErrorFilter::OutOfMemory, || {
                self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(desc.label),
                    size: desc.size,
                    usage,
                    mapped_at_creation: false,
                })
            })
            .map_err(|e| RenderError::allocation(desc.label, e))?;

        let bind_group = (desc.kind == BufferKind::Uniform).then(|| {
            self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(desc.label),
                layout: &self.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        });

        log::debug!("Allocated {:?} buffer '{}' ({} bytes)", desc.kind, desc.label, desc.size);

        let index = self
            .buffers
            .borrow_mut()
            .insert(GpuBufferEntry { buffer, bind_group });
        Ok(BufferHandle::new(index))
    }

    fn write_buffer(&self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        let buffers = self.buffers.borrow();
        match buffers.get(buffer.index()) {
            Some(entry) => self.queue.write_buffer(&entry.buffer, offset, data),
            None => log::warn!("Skipping write to released buffer {:?}", buffer),
        }
    }

    fn destroy_buffer(&self, buffer: BufferHandle) {
        let released = self.buffers.borrow_mut().remove(buffer.index());
        if let Some(entry) = released {
            entry.buffer.destroy();
        }
    }

    fn create_pipeline(
        &self,
        desc: &PipelineDescriptor<'_>,
    ) -> Result<PipelineHandle, RenderError> {
        let pipeline = self
            .scoped(wgpu::ErrorFilter::Validation, || {
                let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(desc.label),
                    source: wgpu::ShaderSource::Wgsl(desc.shader.into()),
                });

                let layouts: Vec<&wgpu::BindGroupLayout> = desc
                    .bindings
                    .iter()
                    .map(|slot| match slot {
                        BindingSlot::Uniform => &self.uniform_layout,
                        BindingSlot::Texture => &self.texture_layout,
                    })
                    .collect();

                let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(desc.label),
                    bind_group_layouts: &layouts,
                    push_constant_ranges: &[],
                });

                PipelineBuilder::new(&self.device, &layout, &shader)
                    .with_label(desc.label)
                    .with_vertex_buffer(desc.vertex_layout.clone())
                    .with_color_target(self.color_format, Some(desc.blend))
                    .with_depth_stencil(self.depth_format, desc.depth_write, desc.depth_compare)
                    .with_topology(desc.topology)
                    .with_cull_mode(desc.cull_mode)
                    .with_front_face(desc.front_face)
                    .build()
            })
            .map_err(|e| RenderError::pipeline(desc.label, e))?;

        log::info!("Created pipeline '{}'", desc.label);

        let mut pipelines = self.pipelines.borrow_mut();
        pipelines.push(pipeline);
        Ok(PipelineHandle::new(pipelines.len() - 1))
    }

    fn uniform_alignment(&self) -> u64 {
        self.device.limits().min_uniform_buffer_offset_alignment as u64
    }
}

/// Records draw-object commands into one render pass.
///
/// The pass ends at [`WgpuRecorder::end_pass`]; commands after that are
/// dropped with a warning.
pub struct WgpuRecorder {
    pass: Option<wgpu::RenderPass<'static>>,
    gpu: Rc<WgpuDevice>,
    textures: Rc<TextureManager>,
}

impl WgpuRecorder {
    pub fn new(
        pass: wgpu::RenderPass<'static>,
        gpu: Rc<WgpuDevice>,
        textures: Rc<TextureManager>,
    ) -> Self {
        Self {
            pass: Some(pass),
            gpu,
            textures,
        }
    }

    pub fn end_pass(&mut self) {
        self.pass.take();
    }

    fn pass(&mut self) -> Option<&mut wgpu::RenderPass<'static>> {
        if self.pass.is_none() {
            log::warn!("Draw command recorded after the render pass ended");
        }
        self.pass.as_mut()
    }
}

impl DrawRecorder for WgpuRecorder {
    fn set_pipeline(&mut self, pipeline: PipelineHandle) {
        let gpu = Rc::clone(&self.gpu);
        let Some(pass) = self.pass() else { return };
        let pipelines = gpu.pipelines.borrow();
        match pipelines.get(pipeline.index()) {
            Some(p) => pass.set_pipeline(p),
            None => log::warn!("Unknown pipeline {:?}", pipeline),
        }
    }

    fn set_vertex_buffer(&mut self, buffer: BufferHandle) {
        let gpu = Rc::clone(&self.gpu);
        let Some(pass) = self.pass() else { return };
        let buffers = gpu.buffers.borrow();
        match buffers.get(buffer.index()) {
            Some(entry) => pass.set_vertex_buffer(0, entry.buffer.slice(..)),
            None => log::warn!("Unknown vertex buffer {:?}", buffer),
        }
    }

    fn set_index_buffer(&mut self, buffer: BufferHandle, format: wgpu::IndexFormat) {
        let gpu = Rc::clone(&self.gpu);
        let Some(pass) = self.pass() else { return };
        let buffers = gpu.buffers.borrow();
        match buffers.get(buffer.index()) {
            Some(entry) => pass.set_index_buffer(entry.buffer.slice(..), format),
            None => log::warn!("Unknown index buffer {:?}", buffer),
        }
    }

    fn set_uniform_block(&mut self, slot: u32, buffer: BufferHandle) {
        let gpu = Rc::clone(&self.gpu);
        let Some(pass) = self.pass() else { return };
        let buffers = gpu.buffers.borrow();
        match buffers.get(buffer.index()) {
            Some(GpuBufferEntry {
                bind_group: Some(group),
                ..
            }) => pass.set_bind_group(slot, group, &[]),
            _ => log::warn!("Buffer {:?} is not a uniform block", buffer),
        }
    }

    fn set_texture(&mut self, slot: u32, texture: TextureHandle) {
        let textures = Rc::clone(&self.textures);
        let Some(pass) = self.pass() else { return };
        if textures
            .with_bind_group(texture, |group| pass.set_bind_group(slot, group, &[]))
            .is_none()
        {
            log::warn!("Unknown texture {:?}", texture);
        }
    }

    fn draw(&mut self, vertex_count: u32) {
        if let Some(pass) = self.pass() {
            pass.draw(0..vertex_count, 0..1);
        }
    }

    fn draw_indexed(&mut self, index_count: u32) {
        if let Some(pass) = self.pass() {
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
    }
}
