use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use glam::Vec3;
use wgpu_drawkit::renderer::headless::HeadlessDevice;
use wgpu_drawkit::renderer::uniforms::WorldTransformUniform;
use wgpu_drawkit::renderer::RenderDevice;
use wgpu_drawkit::WorldTransform;

fn updated(scale: Vec3, rotation: Vec3, translation: Vec3) -> WorldTransform {
    let mut wt = WorldTransform::new(scale, rotation, translation);
    wt.update_matrix();
    wt
}

#[test]
fn translation_moves_origin_without_scaling() {
    let wt = updated(Vec3::ONE, Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0));
    let m = wt.mat_world();

    assert!(m
        .transform_point3(Vec3::ZERO)
        .abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-6));
    for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
        assert!((m.transform_vector3(axis).length() - 1.0).abs() < 1e-6);
    }
}

#[test]
fn rotation_applies_before_translation() {
    let wt = updated(
        Vec3::ONE,
        Vec3::new(0.0, 0.0, FRAC_PI_2),
        Vec3::new(10.0, 0.0, 0.0),
    );
    let p = wt.mat_world().transform_point3(Vec3::X);
    assert!(p.abs_diff_eq(Vec3::new(10.0, 1.0, 0.0), 1e-5), "{:?}", p);
}

#[test]
fn scale_applies_in_local_space() {
    let wt = updated(
        Vec3::new(2.0, 1.0, 1.0),
        Vec3::new(0.0, 0.0, FRAC_PI_2),
        Vec3::ZERO,
    );
    // Stretched along local X first, then rotated onto Y.
    let p = wt.mat_world().transform_point3(Vec3::X);
    assert!(p.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5), "{:?}", p);
}

#[test]
fn euler_axes_apply_z_then_x_then_y() {
    let wt = updated(
        Vec3::ONE,
        Vec3::new(FRAC_PI_2, FRAC_PI_2, 0.0),
        Vec3::ZERO,
    );
    // X: (0,1,0) -> (0,0,1), then Y: (0,0,1) -> (1,0,0)
    let p = wt.mat_world().transform_point3(Vec3::Y);
    assert!(p.abs_diff_eq(Vec3::X, 1e-5), "{:?}", p);
}

#[test]
fn update_matrix_writes_in_place() {
    let headless = Rc::new(HeadlessDevice::new());
    let device: Rc<dyn RenderDevice> = headless.clone();
    let mut wt = WorldTransform::default();
    wt.initialize(&device).unwrap();
    let buffer = wt.uniform_buffer().unwrap();

    for x in [1.0, 2.0, 3.0] {
        wt.translation.x = x;
        wt.update_matrix();
        let uploaded = headless.read::<WorldTransformUniform>(buffer, 1).unwrap()[0];
        assert_eq!(uploaded.mat_world, wt.mat_world().to_cols_array_2d());
    }

    // Same block the whole time.
    assert_eq!(wt.uniform_buffer(), Some(buffer));
    assert_eq!(headless.live_buffer_count(), 1);
}

#[test]
fn initialize_reports_allocation_failure() {
    let headless = Rc::new(HeadlessDevice::new());
    headless.set_fail_allocations(true);
    let device: Rc<dyn RenderDevice> = headless.clone();

    let mut wt = WorldTransform::default();
    assert!(wt.initialize(&device).is_err());
    assert!(!wt.is_initialized());
}
