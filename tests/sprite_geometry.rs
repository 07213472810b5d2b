use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use glam::{Vec2, Vec3, Vec4};
use wgpu_drawkit::renderer::headless::{HeadlessDevice, HeadlessTextures};
use wgpu_drawkit::renderer::vertex::SpriteVertex;
use wgpu_drawkit::renderer::TextureHandle;
use wgpu_drawkit::{Sprite, SpriteCommon, SpriteOptions};

struct Fixture {
    device: Rc<HeadlessDevice>,
    textures: Rc<HeadlessTextures>,
    common: Rc<SpriteCommon>,
}

impl Fixture {
    fn new() -> Self {
        let device = Rc::new(HeadlessDevice::new());
        let textures = Rc::new(HeadlessTextures::new());
        let common =
            SpriteCommon::static_initialize(device.clone(), textures.clone(), 1280, 720).unwrap();
        Self {
            device,
            textures,
            common,
        }
    }

    fn sprite(&self, texture: TextureHandle, options: SpriteOptions) -> Sprite {
        Sprite::create(&self.common, texture, Vec2::new(100.0, 50.0), options).unwrap()
    }
}

fn positions(sprite: &Sprite) -> Vec<[f32; 2]> {
    sprite
        .vertices()
        .iter()
        .map(|v| [v.pos[0], v.pos[1]])
        .collect()
}

fn uvs(sprite: &Sprite) -> Vec<[f32; 2]> {
    sprite.vertices().iter().map(|v| v.uv).collect()
}

#[test]
fn top_left_anchor_spans_zero_to_size() {
    let fx = Fixture::new();
    let tex = fx.textures.register(64, 32);
    let sprite = fx.sprite(tex, SpriteOptions::default());

    // LB, LT, RB, RT
    assert_eq!(
        positions(&sprite),
        vec![[0.0, 32.0], [0.0, 0.0], [64.0, 32.0], [64.0, 0.0]]
    );
    assert!(sprite.vertices().iter().all(|v| v.pos[2] == 0.0));
}

#[test]
fn flip_x_negates_only_x() {
    let fx = Fixture::new();
    let tex = fx.textures.register(64, 32);
    let mut sprite = fx.sprite(
        tex,
        SpriteOptions {
            anchor_point: Vec2::new(0.25, 0.5),
            ..SpriteOptions::default()
        },
    );
    let original = positions(&sprite);

    sprite.set_is_flip_x(true);
    let flipped = positions(&sprite);
    for (a, b) in original.iter().zip(&flipped) {
        assert_eq!(b[0], -a[0]);
        assert_eq!(b[1], a[1]);
    }

    sprite.set_is_flip_x(false);
    assert_eq!(positions(&sprite), original);
}

#[test]
fn flip_y_negates_only_y() {
    let fx = Fixture::new();
    let tex = fx.textures.register(64, 32);
    let mut sprite = fx.sprite(
        tex,
        SpriteOptions {
            anchor_point: Vec2::new(0.25, 0.5),
            ..SpriteOptions::default()
        },
    );
    let original = positions(&sprite);

    sprite.set_is_flip_y(true);
    let flipped = positions(&sprite);
    for (a, b) in original.iter().zip(&flipped) {
        assert_eq!(b[0], a[0]);
        assert_eq!(b[1], -a[1]);
    }

    sprite.set_is_flip_y(false);
    assert_eq!(positions(&sprite), original);
}

#[test]
fn flips_from_options_apply_at_creation() {
    let fx = Fixture::new();
    let tex = fx.textures.register(8, 4);
    let sprite = fx.sprite(
        tex,
        SpriteOptions {
            is_flip_x: true,
            is_flip_y: true,
            ..SpriteOptions::default()
        },
    );
    assert_eq!(
        positions(&sprite),
        vec![[0.0, -4.0], [0.0, 0.0], [-8.0, -4.0], [-8.0, 0.0]]
    );
}

#[test]
fn anchor_is_not_clamped() {
    let fx = Fixture::new();
    let tex = fx.textures.register(16, 16);
    let mut sprite = fx.sprite(tex, SpriteOptions::default());
    sprite.set_size(Vec2::new(10.0, 20.0));

    sprite.set_anchor_point(Vec2::new(0.5, 0.5));
    assert_eq!(
        positions(&sprite),
        vec![[-5.0, 10.0], [-5.0, -10.0], [5.0, 10.0], [5.0, -10.0]]
    );

    sprite.set_anchor_point(Vec2::new(1.5, -0.5));
    assert_eq!(
        positions(&sprite),
        vec![[-15.0, 30.0], [-15.0, 10.0], [-5.0, 30.0], [-5.0, 10.0]]
    );
    assert_eq!(sprite.anchor_point(), Vec2::new(1.5, -0.5));
}

#[test]
fn full_texture_rect_covers_unit_square() {
    let fx = Fixture::new();
    let tex = fx.textures.register(300, 70);
    let sprite = fx.sprite(tex, SpriteOptions::default());

    assert_eq!(
        uvs(&sprite),
        vec![[0.0, 1.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]]
    );
}

#[test]
fn sub_rect_normalizes_by_texture_size() {
    let fx = Fixture::new();
    let tex = fx.textures.register(128, 64);
    let mut sprite = fx.sprite(tex, SpriteOptions::default());
    sprite.set_texture_rect(Vec2::new(32.0, 16.0), Vec2::new(16.0, 16.0));

    assert_eq!(
        uvs(&sprite),
        vec![[0.25, 0.5], [0.25, 0.25], [0.375, 0.5], [0.375, 0.25]]
    );
    // Rendered size is independent of the texture rect.
    assert_eq!(sprite.size(), Vec2::new(128.0, 64.0));
}

#[test]
fn position_and_rotation_do_not_touch_geometry() {
    let fx = Fixture::new();
    let tex = fx.textures.register(16, 8);
    let mut sprite = fx.sprite(tex, SpriteOptions::default());
    let before = *sprite.vertices();

    sprite.set_position(Vec2::new(400.0, 300.0));
    sprite.set_rotation(1.0);

    assert_eq!(*sprite.vertices(), before);
    assert_eq!(sprite.position(), Vec2::new(400.0, 300.0));
    assert_eq!(sprite.rotation(), 1.0);
}

#[test]
fn every_geometry_setter_reaches_the_buffer() {
    let fx = Fixture::new();
    let tex = fx.textures.register(16, 16);
    let mut sprite = fx.sprite(tex, SpriteOptions::default());

    let check = |sprite: &Sprite| {
        let uploaded = fx
            .device
            .read::<SpriteVertex>(sprite.vertex_buffer(), 4)
            .unwrap();
        assert_eq!(uploaded.as_slice(), sprite.vertices().as_slice());
    };

    sprite.set_size(Vec2::new(3.0, 5.0));
    check(&sprite);
    sprite.set_anchor_point(Vec2::new(1.0, 1.0));
    check(&sprite);
    sprite.set_is_flip_x(true);
    check(&sprite);
    sprite.set_is_flip_y(true);
    check(&sprite);
    sprite.set_texture_rect(Vec2::new(4.0, 4.0), Vec2::new(8.0, 8.0));
    check(&sprite);
}

#[test]
fn switching_texture_renormalizes_uvs() {
    let fx = Fixture::new();
    let small = fx.textures.register(16, 16);
    let large = fx.textures.register(32, 64);
    let mut sprite = fx.sprite(small, SpriteOptions::default());

    sprite.set_texture_handle(large).unwrap();

    assert_eq!(sprite.texture_handle(), large);
    // Rect stays 16x16 texels, now half by a quarter of the new texture.
    assert_eq!(
        uvs(&sprite),
        vec![[0.0, 0.25], [0.0, 0.0], [0.5, 0.25], [0.5, 0.0]]
    );
}

#[test]
fn switching_to_unknown_texture_keeps_state() {
    let fx = Fixture::new();
    let tex = fx.textures.register(16, 16);
    let mut sprite = fx.sprite(tex, SpriteOptions::default());

    assert!(sprite.set_texture_handle(TextureHandle::new(99)).is_err());
    assert_eq!(sprite.texture_handle(), tex);
}

#[test]
fn color_is_stored_until_draw() {
    let fx = Fixture::new();
    let tex = fx.textures.register(16, 16);
    let mut sprite = fx.sprite(tex, SpriteOptions::default());

    sprite.set_color(Vec4::new(0.0, 1.0, 0.0, 0.5));
    assert_eq!(sprite.color(), Vec4::new(0.0, 1.0, 0.0, 0.5));
    assert_eq!(fx.device.buffer_bytes(sprite.uniform_buffer()).unwrap().len(), 256);
}

#[test]
fn rotation_pivots_about_the_sprite_position() {
    let fx = Fixture::new();
    let tex = fx.textures.register(16, 16);
    let mut sprite = fx.sprite(tex, SpriteOptions::default());
    sprite.set_position(Vec2::new(100.0, 50.0));
    sprite.set_rotation(FRAC_PI_2);

    let world = fx.common.projection().inverse() * sprite.transform();
    let p = world.transform_point3(Vec3::X);
    assert!(p.abs_diff_eq(Vec3::new(100.0, 51.0, 0.0), 1e-3), "{:?}", p);

    // The local origin stays on the position whatever the rotation.
    let origin = world.transform_point3(Vec3::ZERO);
    assert!(origin.abs_diff_eq(Vec3::new(100.0, 50.0, 0.0), 1e-3), "{:?}", origin);
}

#[test]
fn dropped_sprites_give_their_buffer_slots_back() {
    let fx = Fixture::new();
    let tex = fx.textures.register(16, 16);
    let keep = fx.sprite(tex, SpriteOptions::default());
    drop(fx.sprite(tex, SpriteOptions::default()));
    let slots = fx.device.buffer_slot_count();

    for _ in 0..100 {
        drop(fx.sprite(tex, SpriteOptions::default()));
    }

    assert_eq!(fx.device.buffer_slot_count(), slots);
    assert_eq!(fx.device.live_buffer_count(), 2);
    assert_eq!(keep.vertices().len(), 4);
}
