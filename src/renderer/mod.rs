pub mod context;
pub mod depth;
pub mod device;
pub mod handle;
pub mod headless;
pub mod mapped;
pub mod pipeline_builder;
pub mod primitives;
pub mod session;
pub mod texture;
pub mod uniforms;
pub mod vertex;
pub mod wgpu_backend;

pub use context::RenderContext;
pub use depth::Depth;
pub use device::{
    BindingSlot, BufferHandle, BufferKind, DrawRecorder, PipelineDescriptor, PipelineHandle,
    RenderDevice, SharedRecorder, TextureHandle, TextureProvider,
};
pub use handle::Handle;
pub use mapped::{MappedBuffer, UniformBlock};
pub use primitives::cube_mesh;
pub use session::DrawSession;
pub use texture::TextureManager;
pub use vertex::{SpriteVertex, Vertex};
pub use wgpu_backend::{WgpuDevice, WgpuRecorder};
