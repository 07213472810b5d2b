use std::rc::Rc;

use crate::draw::ALPHA_OVER;
use crate::error::RenderError;
use crate::renderer::device::{
    BindingSlot, BufferHandle, BufferKind, PipelineDescriptor, PipelineHandle, RenderDevice,
    SharedRecorder, TextureHandle, TextureProvider,
};
use crate::renderer::mapped::MappedBuffer;
use crate::renderer::primitives::cube_mesh;
use crate::renderer::session::DrawSession;
use crate::renderer::vertex::Vertex;
use crate::scene::{ViewProjection, WorldTransform};

const MODEL_SHADER: &str = include_str!("../shaders/model.wgsl");
const MODEL_BINDINGS: &[BindingSlot] = &[
    BindingSlot::Uniform,
    BindingSlot::Uniform,
    BindingSlot::Texture,
];

pub const SLOT_WORLD_TRANSFORM: u32 = 0;
pub const SLOT_VIEW_PROJECTION: u32 = 1;
pub const SLOT_TEXTURE: u32 = 2;

pub struct ModelCommon {
    device: Rc<dyn RenderDevice>,
    textures: Rc<dyn TextureProvider>,
    pipeline: PipelineHandle,
    session: DrawSession,
}

impl ModelCommon {
    pub fn static_initialize(
        device: Rc<dyn RenderDevice>,
        textures: Rc<dyn TextureProvider>,
    ) -> Result<Rc<Self>, RenderError> {
        let pipeline = device.create_pipeline(&Self::pipeline_descriptor())?;
        log::info!("Model pipeline initialized");
        Ok(Rc::new(Self {
            device,
            textures,
            pipeline,
            session: DrawSession::new("Model"),
        }))
    }

    /// Depth tested, back faces culled (clockwise is front), triangle list.
    pub fn pipeline_descriptor() -> PipelineDescriptor<'static> {
        PipelineDescriptor {
            label: "Model Pipeline",
            shader: MODEL_SHADER,
            vertex_layout: Vertex::layout(),
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: Some(wgpu::Face::Back),
            blend: ALPHA_OVER,
            depth_compare: wgpu::CompareFunction::Less,
            depth_write: true,
            bindings: MODEL_BINDINGS,
        }
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

/// The fixed cube mesh. Pose, camera and texture come from the caller on
/// every draw.
///
/// Each instance owns its vertex and index buffers; they are written once by
/// [`Model::create`] and released when the model is dropped.
pub struct Model {
    common: Rc<ModelCommon>,
    vertex_buffer: MappedBuffer,
    index_buffer: MappedBuffer,
    index_count: u32,
}

impl Model {
    pub fn create(common: &Rc<ModelCommon>) -> Result<Self, RenderError> {
        let (vertices, indices) = cube_mesh();

        let vertex_buffer = MappedBuffer::new(
            &common.device,
            "ModelVertexBuffer",
            std::mem::size_of_val(vertices.as_slice()) as u64,
            BufferKind::Vertex,
        )?;
        let index_buffer = MappedBuffer::new(
            &common.device,
            "ModelIndexBuffer",
            std::mem::size_of_val(indices.as_slice()) as u64,
            BufferKind::Index,
        )?;
        vertex_buffer.write(&vertices);
        index_buffer.write(&indices);

        log::debug!(
            "Created model mesh ({} vertices, {} indices)",
            vertices.len(),
            indices.len()
        );

        Ok(Self {
            common: Rc::clone(common),
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer.handle()
    }

    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer.handle()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// `world_transform` must be initialized and its matrix already updated
    /// for this frame. Panics outside a model draw session.
    pub fn draw(
        &self,
        world_transform: &WorldTransform,
        view_projection: &ViewProjection,
        texture: TextureHandle,
    ) {
        let common = &self.common;
        common.session.with_recorder(|recorder| {
            let Some(world) = world_transform.uniform_buffer() else {
                panic!("Model::draw called with an uninitialized WorldTransform");
            };
            let Some(camera) = view_projection.uniform_buffer() else {
                panic!("Model::draw called with an uninitialized ViewProjection");
            };

            recorder.set_vertex_buffer(self.vertex_buffer.handle());
            recorder.set_index_buffer(self.index_buffer.handle(), wgpu::IndexFormat::Uint16);
            recorder.set_uniform_block(SLOT_WORLD_TRANSFORM, world);
            recorder.set_uniform_block(SLOT_VIEW_PROJECTION, camera);
            common.textures.bind_texture(recorder, SLOT_TEXTURE, texture);
            recorder.draw_indexed(self.index_count);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::{
        DrawCommand, HeadlessDevice, HeadlessTextures, RecordingRecorder,
    };

    fn setup() -> (Rc<HeadlessDevice>, Rc<HeadlessTextures>, Rc<ModelCommon>) {
        let device = Rc::new(HeadlessDevice::new());
        let textures = Rc::new(HeadlessTextures::new());
        let common = ModelCommon::static_initialize(device.clone(), textures.clone()).unwrap();
        (device, textures, common)
    }

    #[test]
    fn pipeline_matches_mesh_state() {
        let (device, _, common) = setup();
        let record = device.pipeline(common.pipeline()).unwrap();
        assert_eq!(record.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(record.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(record.front_face, wgpu::FrontFace::Cw);
        assert_eq!(record.depth_compare, wgpu::CompareFunction::Less);
        assert_eq!(
            record.bindings,
            vec![BindingSlot::Uniform, BindingSlot::Uniform, BindingSlot::Texture]
        );
    }

    #[test]
    fn create_uploads_the_cube() {
        let (device, _, common) = setup();
        let model = Model::create(&common).unwrap();
        let (vertices, indices) = cube_mesh();

        assert_eq!(model.index_count(), 36);
        assert_eq!(device.read::<Vertex>(model.vertex_buffer(), 24).unwrap(), vertices);
        assert_eq!(device.read::<u16>(model.index_buffer(), 36).unwrap(), indices);
        assert_eq!(device.buffer_kind(model.index_buffer()), Some(BufferKind::Index));
    }

    #[test]
    fn each_model_owns_its_buffers() {
        let (device, _, common) = setup();
        let first = Model::create(&common).unwrap();
        let second = Model::create(&common).unwrap();
        assert_ne!(first.vertex_buffer(), second.vertex_buffer());
        assert_ne!(first.index_buffer(), second.index_buffer());

        drop(first);
        assert_eq!(device.live_buffer_count(), 2);
        assert_eq!(device.read::<u16>(second.index_buffer(), 36).unwrap(), cube_mesh().1);
    }

    #[test]
    fn draw_binds_three_slots_and_issues_36_indices() {
        let (device, textures, common) = setup();
        let dyn_device: Rc<dyn RenderDevice> = device.clone();
        let model = Model::create(&common).unwrap();
        let tex = textures.register(1, 1);
        let mut world = WorldTransform::default();
        world.initialize(&dyn_device).unwrap();
        let mut camera = ViewProjection::new(1280, 720);
        camera.initialize(&dyn_device).unwrap();

        let (recorder, log) = RecordingRecorder::shared();
        common.pre_draw(&recorder);
        model.draw(&world, &camera, tex);
        common.post_draw();

        let log = log.borrow();
        assert_eq!(log[0], DrawCommand::SetPipeline(common.pipeline()));
        assert_eq!(log[1], DrawCommand::SetVertexBuffer(model.vertex_buffer()));
        assert_eq!(
            log[2],
            DrawCommand::SetIndexBuffer(model.index_buffer(), wgpu::IndexFormat::Uint16)
        );
        assert_eq!(
            log[3],
            DrawCommand::SetUniformBlock {
                slot: 0,
                buffer: world.uniform_buffer().unwrap()
            }
        );
        assert_eq!(
            log[4],
            DrawCommand::SetUniformBlock {
                slot: 1,
                buffer: camera.uniform_buffer().unwrap()
            }
        );
        assert_eq!(log[5], DrawCommand::SetTexture { slot: 2, texture: tex });
        assert_eq!(log[6], DrawCommand::DrawIndexed { index_count: 36 });
    }

    #[test]
    #[should_panic(expected = "Model::draw called with an uninitialized WorldTransform")]
    fn draw_rejects_uninitialized_world_transform() {
        let (device, textures, common) = setup();
        let dyn_device: Rc<dyn RenderDevice> = device.clone();
        let model = Model::create(&common).unwrap();
        let tex = textures.register(1, 1);
        let world = WorldTransform::default();
        let mut camera = ViewProjection::new(1280, 720);
        camera.initialize(&dyn_device).unwrap();

        let (recorder, _log) = RecordingRecorder::shared();
        common.pre_draw(&recorder);
        model.draw(&world, &camera, tex);
    }

    #[test]
    #[should_panic(expected = "Model::draw called outside of a draw session")]
    fn draw_without_session_panics() {
        let (device, textures, common) = setup();
        let dyn_device: Rc<dyn RenderDevice> = device.clone();
        let model = Model::create(&common).unwrap();
        let tex = textures.register(1, 1);
        let mut world = WorldTransform::default();
        world.initialize(&dyn_device).unwrap();
        let mut camera = ViewProjection::new(1280, 720);
        camera.initialize(&dyn_device).unwrap();

        model.draw(&world, &camera, tex);
    }
}
