use std::rc::Rc;

use glam::Vec2;

use crate::draw::sprite::{Sprite, SpriteCommon, SpriteOptions};
use crate::error::RenderError;
use crate::renderer::device::TextureHandle;

pub const MAX_CHAR_COUNT: usize = 256;
/// Glyph cell width in atlas texels.
pub const FONT_WIDTH: i32 = 9;
/// Glyph cell height in atlas texels.
pub const FONT_HEIGHT: i32 = 18;
/// Glyphs per atlas row.
pub const FONT_LINE_COUNT: i32 = 14;

/// Monospace text drawn from a fixed pool of glyph sprites.
///
/// `print` only places glyphs; nothing reaches the screen until
/// [`DebugText::draw_all`], which also empties the pool for the next frame.
pub struct DebugText {
    sprites: Vec<Sprite>,
    sprite_index: usize,
}

impl DebugText {
    pub fn initialize(
        common: &Rc<SpriteCommon>,
        font_texture: TextureHandle,
    ) -> Result<Self, RenderError> {
        let sprites = (0..MAX_CHAR_COUNT)
            .map(|_| Sprite::create(common, font_texture, Vec2::ZERO, SpriteOptions::default()))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("Debug text ready ({} glyph slots)", sprites.len());
        Ok(Self {
            sprites,
            sprite_index: 0,
        })
    }

    /// Atlas cell (column, row) for one byte. Bytes from 0x7F up use cell
    /// (0, 0); control bytes yield negative cells.
    pub fn glyph_cell(byte: u8) -> (i32, i32) {
        let font_index = if byte >= 0x7f { 0 } else { i32::from(byte) - 32 };
        (font_index % FONT_LINE_COUNT, font_index / FONT_LINE_COUNT)
    }

    /// Lays `text` out left to right from (x, y). Characters beyond the pool
    /// capacity are dropped.
    pub fn print(&mut self, text: &str, x: f32, y: f32, scale: f32) {
        let glyph_size = Vec2::new(FONT_WIDTH as f32, FONT_HEIGHT as f32);

        for (i, byte) in text.bytes().enumerate() {
            if self.sprite_index >= MAX_CHAR_COUNT {
                log::trace!("Debug text pool full, dropping {} bytes", text.len() - i);
                break;
            }

            let (cell_x, cell_y) = Self::glyph_cell(byte);
            let sprite = &mut self.sprites[self.sprite_index];
            sprite.set_position(Vec2::new(x + FONT_WIDTH as f32 * scale * i as f32, y));
            sprite.set_texture_rect(
                Vec2::new((cell_x * FONT_WIDTH) as f32, (cell_y * FONT_HEIGHT) as f32),
                glyph_size,
            );
            sprite.set_size(glyph_size * scale);

            self.sprite_index += 1;
        }
    }

    pub fn draw_all(&mut self) {
        for sprite in &self.sprites[..self.sprite_index] {
            sprite.draw();
        }
        self.sprite_index = 0;
    }

    pub fn live_count(&self) -> usize {
        self.sprite_index
    }

    pub fn capacity(&self) -> usize {
        self.sprites.len()
    }

    /// Pool slot `index`, live or not.
    pub fn glyph(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }
}
