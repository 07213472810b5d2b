// demo.rs
use std::rc::Rc;

use glam::{Vec2, Vec3, Vec4};

use crate::draw::debug_text::{FONT_HEIGHT, FONT_LINE_COUNT, FONT_WIDTH};
use crate::draw::{DebugText, Model, ModelCommon, Sprite, SpriteCommon, SpriteOptions};
use crate::error::RenderError;
use crate::renderer::{RenderContext, RenderDevice, TextureHandle, TextureManager, TextureProvider};
use crate::scene::{ViewProjection, WorldTransform};
use crate::settings::RenderSettings;

/// Rotating cube, a spinning sprite and an FPS line.
pub struct DemoScene {
    textures: Rc<TextureManager>,
    sprite_common: Rc<SpriteCommon>,
    model_common: Rc<ModelCommon>,
    model: Model,
    world: WorldTransform,
    camera: ViewProjection,
    checker: TextureHandle,
    sprite: Sprite,
    text_panel: Sprite,
    debug_text: DebugText,
    fps: f64,
}

impl DemoScene {
    pub fn new(ctx: &RenderContext, settings: &RenderSettings) -> Result<Self, RenderError> {
        let device: Rc<dyn RenderDevice> = ctx.gpu().clone();
        let textures = Rc::new(TextureManager::new(Rc::clone(ctx.gpu())));
        let provider: Rc<dyn TextureProvider> = textures.clone();
        let size = ctx.size();

        let sprite_common = SpriteCommon::static_initialize(
            Rc::clone(&device),
            Rc::clone(&provider),
            size.width,
            size.height,
        )?;
        let model_common = ModelCommon::static_initialize(Rc::clone(&device), provider)?;

        let checker = checker_texture(&textures, 64, 8);
        let font = match textures.load(&settings.debug_font) {
            Ok(font) => font,
            Err(err) => {
                log::warn!("{err}; debug text will render as solid cells");
                blank_font_texture(&textures)
            }
        };

        let model = Model::create(&model_common)?;
        let mut world = WorldTransform::new(Vec3::splat(5.0), Vec3::ZERO, Vec3::ZERO);
        world.initialize(&device)?;
        let mut camera = ViewProjection::new(size.width, size.height);
        camera.initialize(&device)?;

        let mut sprite = Sprite::create(
            &sprite_common,
            checker,
            Vec2::new(size.width as f32 - 96.0, 96.0),
            SpriteOptions {
                color: Vec4::new(1.0, 1.0, 1.0, 0.8),
                anchor_point: Vec2::splat(0.5),
                ..SpriteOptions::default()
            },
        )?;
        sprite.set_size(Vec2::splat(128.0));

        // Untextured backdrop behind the debug lines.
        let mut text_panel = Sprite::create(
            &sprite_common,
            textures.white(),
            Vec2::splat(4.0),
            SpriteOptions {
                color: Vec4::new(0.0, 0.0, 0.0, 0.5),
                ..SpriteOptions::default()
            },
        )?;
        text_panel.set_size(Vec2::new(
            (FONT_WIDTH * 2 * 12) as f32 + 8.0,
            (FONT_HEIGHT * 4) as f32 + 8.0,
        ));

        let debug_text = DebugText::initialize(&sprite_common, font)?;

        Ok(Self {
            textures,
            sprite_common,
            model_common,
            model,
            world,
            camera,
            checker,
            sprite,
            text_panel,
            debug_text,
            fps: 0.0,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.aspect_ratio = width as f32 / height.max(1) as f32;
        self.camera.update_matrix();
    }

    pub fn update(&mut self, dt: f64) {
        if dt > 0.0 {
            self.fps = self.fps * 0.9 + (1.0 / dt) * 0.1;
        }
        let dt = dt as f32;

        self.world.rotation.y += dt;
        self.world.rotation.x += dt * 0.5;
        self.world.update_matrix();

        self.sprite.set_rotation(self.sprite.rotation() + dt);
    }

    pub fn render(&mut self, ctx: &mut RenderContext) -> Result<(), RenderError> {
        ctx.render_frame(&self.textures, |recorder| {
            self.model_common.pre_draw(recorder);
            self.model.draw(&self.world, &self.camera, self.checker);
            self.model_common.post_draw();

            self.sprite_common.pre_draw(recorder);
            self.sprite.draw();
            self.text_panel.draw();
            self.debug_text
                .print(&format!("FPS: {:.1}", self.fps), 8.0, 8.0, 1.0);
            self.debug_text
                .print("wgpu-drawkit", 8.0, 8.0 + FONT_HEIGHT as f32 * 2.0, 2.0);
            self.debug_text.draw_all();
            self.sprite_common.post_draw();
        })
    }
}

fn checker_texture(textures: &TextureManager, size: u32, cells: u32) -> TextureHandle {
    let cell = (size / cells).max(1);
    let pixels: Vec<u8> = (0..size * size)
        .flat_map(|i| {
            let (x, y) = (i % size, i / size);
            if (x / cell + y / cell) % 2 == 0 {
                [235, 235, 235, 255]
            } else {
                [40, 90, 160, 255]
            }
        })
        .collect();
    textures.create_rgba8(size, size, &pixels, "checker")
}

/// Opaque atlas with the debug font's dimensions.
fn blank_font_texture(textures: &TextureManager) -> TextureHandle {
    let width = (FONT_WIDTH * FONT_LINE_COUNT) as u32;
    let height = (FONT_HEIGHT * 7) as u32;
    let pixels = vec![255u8; (width * height * 4) as usize];
    textures.create_rgba8(width, height, &pixels, "debugfont (blank)")
}
