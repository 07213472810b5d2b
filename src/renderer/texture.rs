// renderer/texture.rs

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::error::RenderError;
use crate::renderer::device::{TextureHandle, TextureProvider};
use crate::renderer::wgpu_backend::WgpuDevice;

#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    bind_group: wgpu::BindGroup,
}

/// Owns every texture the draw objects can reference by [`TextureHandle`].
///
/// Handle 0 is always a 1x1 white texture, usable as "no texture".
pub struct TextureManager {
    gpu: Rc<WgpuDevice>,
    textures: RefCell<Vec<Texture>>,
}

impl TextureManager {
    pub fn new(gpu: Rc<WgpuDevice>) -> Self {
        let manager = Self {
            gpu,
            textures: RefCell::new(Vec::new()),
        };
        manager.create_rgba8(1, 1, &[255, 255, 255, 255], "white1x1");
        manager
    }

    pub fn white(&self) -> TextureHandle {
        TextureHandle::new(0)
    }

    /// Decode an image file and upload it as an sRGB texture.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<TextureHandle, RenderError> {
        let path = path.as_ref();
        log::info!("Loading texture: {:?}", path);

        let img = image::open(path).map_err(|e| RenderError::TextureLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let label = path.to_string_lossy();

        Ok(self.create_rgba8(width, height, &rgba, &label))
    }

    /// Upload tightly packed RGBA8 pixels.
    pub fn create_rgba8(&self, width: u32, height: u32, data: &[u8], label: &str) -> TextureHandle {
        let device = self.gpu.device();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler_label = format!("{label} Sampler");
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&sampler_label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: self.gpu.texture_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let mut textures = self.textures.borrow_mut();
        textures.push(Texture {
            texture,
            view,
            sampler,
            width,
            height,
            bind_group,
        });
        log::debug!("Registered texture '{label}' ({width}x{height})");
        TextureHandle::new(textures.len() - 1)
    }

    pub(crate) fn with_bind_group<R>(
        &self,
        texture: TextureHandle,
        f: impl FnOnce(&wgpu::BindGroup) -> R,
    ) -> Option<R> {
        self.textures
            .borrow()
            .get(texture.index())
            .map(|tex| f(&tex.bind_group))
    }
}

impl TextureProvider for TextureManager {
    fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures
            .borrow()
            .get(texture.index())
            .map(|tex| (tex.width, tex.height))
    }
}
