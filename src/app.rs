// app.rs
use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::demo::DemoScene;
use crate::error::{OrAbort, RenderError};
use crate::renderer::RenderContext;
use crate::settings::RenderSettings;

pub struct App {
    settings: RenderSettings,
    window: Option<Arc<Window>>,
    context: Option<RenderContext>,
    scene: Option<DemoScene>,
    last_frame: Instant,
}

impl App {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            window: None,
            context: None,
            scene: None,
            last_frame: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let resolution = &self.settings.resolution;
        let attributes = Window::default_attributes()
            .with_title("wgpu-drawkit")
            .with_inner_size(PhysicalSize::new(resolution.width, resolution.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let context = pollster::block_on(RenderContext::new(Arc::clone(&window), &self.settings))
            .or_abort("Failed to initialize the graphics device");
        let scene = DemoScene::new(&context, &self.settings)
            .or_abort("Failed to create draw objects");

        window.request_redraw();
        self.window = Some(window);
        self.context = Some(context);
        self.scene = Some(scene);
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.id() != id {
            return;
        }
        let (Some(context), Some(scene)) = (self.context.as_mut(), self.scene.as_mut()) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                context.resize(size);
                scene.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.last_frame).as_secs_f64();
                self.last_frame = now;

                scene.update(dt);
                match scene.render(context) {
                    Ok(()) => {}
                    Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                        log::error!("Surface out of memory, exiting");
                        event_loop.exit();
                    }
                    Err(err) => log::warn!("Frame skipped: {err}"),
                }

                window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            _ => {}
        }
    }
}
