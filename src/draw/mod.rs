//! Immediate-mode draw objects: sprites, the cube model and debug text.

pub mod debug_text;
pub mod model;
pub mod sprite;

pub use debug_text::DebugText;
pub use model::{Model, ModelCommon};
pub use sprite::{Sprite, SpriteCommon, SpriteOptions};

/// Straight-alpha "over" for color, source alpha replaces destination alpha.
pub(crate) const ALPHA_OVER: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::Zero,
        operation: wgpu::BlendOperation::Add,
    },
};
