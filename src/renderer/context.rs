use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::RenderError;
use crate::renderer::depth::{Depth, DEPTH_FORMAT};
use crate::renderer::device::SharedRecorder;
use crate::renderer::texture::TextureManager;
use crate::renderer::wgpu_backend::{WgpuDevice, WgpuRecorder};
use crate::settings::RenderSettings;

/// Window surface plus the device every draw object allocates from.
pub struct RenderContext {
    surface: wgpu::Surface<'static>,
    gpu: Rc<WgpuDevice>,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: Depth,
    clear_color: wgpu::Color,
}

impl RenderContext {
    pub async fn new(window: Arc<Window>, settings: &RenderSettings) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| RenderError::Device("surface reports no formats".into()))?;

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: settings.present_mode(&surface_caps.present_modes),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("Surface configured: {:?} {}x{}", format, config.width, config.height);

        let depth = Depth::new(&device, size);
        let gpu = Rc::new(WgpuDevice::new(device, queue, format, DEPTH_FORMAT));

        Ok(Self {
            surface,
            gpu,
            config,
            size,
            depth,
            clear_color: settings.clear_color(),
        })
    }

    pub fn gpu(&self) -> &Rc<WgpuDevice> {
        &self.gpu
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(self.gpu.device(), &self.config);
        self.depth = Depth::new(self.gpu.device(), new_size);
    }

    /// Clears the frame, opens one render pass and hands its recorder to
    /// `draw`. Sessions opened inside `draw` must be closed before it returns.
    pub fn render_frame(
        &mut self,
        textures: &Rc<TextureManager>,
        draw: impl FnOnce(&SharedRecorder),
    ) -> Result<(), RenderError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(self.gpu.device(), &self.config);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Draw Objects Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.clear_color),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.depth.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            let recorder = Rc::new(RefCell::new(WgpuRecorder::new(
                pass,
                Rc::clone(&self.gpu),
                Rc::clone(textures),
            )));
            let shared: SharedRecorder = recorder.clone();
            draw(&shared);

            if Rc::strong_count(&recorder) > 2 {
                log::error!("A draw session is still open at the end of the frame");
            }
            recorder.borrow_mut().end_pass();
        }

        self.gpu.queue().submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
