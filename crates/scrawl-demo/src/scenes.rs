//! Content of the demo scenes.
//!
//! Builders are generic over the buffer backend so they can be checked on the host.

use std::f32::consts::TAU;

use glam::Vec3;
use scrawl_engine::buffer::BufferDevice;
use scrawl_engine::paint::Color;
use scrawl_engine::scene::Scene;

pub const SINE_SAMPLES: usize = 96;

/// Unit axes with a tick every half unit and a square marking each tip.
pub fn build_axes<D: BufferDevice>(scene: &mut Scene<D>) {
    let axes = [
        (Vec3::X, Color::from_straight(0.95, 0.25, 0.25, 1.0)),
        (Vec3::Y, Color::from_straight(0.30, 0.90, 0.35, 1.0)),
        (Vec3::Z, Color::from_straight(0.30, 0.45, 1.00, 1.0)),
    ];

    for (axis, color) in axes {
        scene.set_color(color);
        scene.set_size(3.0);
        scene.line(Vec3::ZERO, axis);

        scene.set_size(6.0);
        for step in 1..=2 {
            scene.point(axis * (step as f32 * 0.5));
        }

        scene.set_size(10.0);
        scene.anchored_square(axis * 1.1);
    }
}

/// A small chevron with a dot, replicated on a grid of instances.
pub fn build_sprinkles<D: BufferDevice>(scene: &mut Scene<D>, grid: i32) {
    scene.set_color(Color::from_straight(1.0, 0.8, 0.2, 0.8));
    scene.set_size(2.0);
    scene.line_to(Vec3::new(-0.1, 0.0, 0.0));
    scene.line_to(Vec3::new(0.0, 0.15, 0.0));
    scene.line_to(Vec3::new(0.1, 0.0, 0.0));
    scene.line_end();

    scene.set_size(5.0);
    scene.point(Vec3::ZERO);

    scene.clear_instances();
    for x in -grid..=grid {
        for z in -grid..=grid {
            let position = Vec3::new(x as f32, 0.0, z as f32) * 0.6;
            let spin = Vec3::Y * ((x * 7 + z * 3) as f32 * 0.35);
            scene.add_instance_trs(position, spin, Vec3::splat(1.0 + 0.1 * (x + z).abs() as f32));
        }
    }
}

/// Fixed frame around the animated ribbon; checkpointed so each frame can restore to it.
pub fn build_ribbon_frame<D: BufferDevice>(scene: &mut Scene<D>) {
    scene.set_color(Color::from_straight(0.6, 0.6, 0.6, 0.5));
    scene.set_size(1.0);
    scene.line(Vec3::new(-1.5, -0.5, 0.0), Vec3::new(1.5, -0.5, 0.0));
    scene.line(Vec3::new(-1.5, 0.5, 0.0), Vec3::new(1.5, 0.5, 0.0));
    scene.save();
}

/// Replaces last frame's ribbon with the one at time `t`.
pub fn animate_ribbon<D: BufferDevice>(scene: &mut Scene<D>, t: f32) {
    scene.restore();

    scene.set_size(4.0);
    for i in 0..SINE_SAMPLES {
        let u = i as f32 / (SINE_SAMPLES - 1) as f32;
        let x = -1.5 + 3.0 * u;
        let y = 0.4 * (TAU * u * 2.0 + t * 2.0).sin();

        scene.set_color(Color::from_straight(u, 0.4, 1.0 - u, 1.0));
        scene.line_to(Vec3::new(x, y, 0.0));
    }
    scene.line_end();

    let head = (t * 0.25).fract();
    scene.set_size(12.0);
    scene.set_color(Color::WHITE);
    scene.anchored_square(Vec3::new(-1.5 + 3.0 * head, 0.6, 0.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_engine::buffer::HostDevice;

    #[test]
    fn axes_have_three_segments() {
        let mut scene: Scene<HostDevice> = Scene::new();
        build_axes(&mut scene);

        let counts = scene.counts();
        assert_eq!(counts.line_vertices, 3 * 4);
        assert_eq!(counts.point_vertices, 6 * 4);
        assert_eq!(counts.anchor_vertices, 3 * 4);
        assert_eq!(counts.instances, 1);
    }

    #[test]
    fn sprinkles_replace_identity_instance() {
        let mut scene: Scene<HostDevice> = Scene::new();
        build_sprinkles(&mut scene, 2);
        assert_eq!(scene.counts().instances, 25);
    }

    #[test]
    fn ribbon_does_not_accumulate_across_frames() {
        let mut scene: Scene<HostDevice> = Scene::new();
        build_ribbon_frame(&mut scene);
        let base = scene.counts();

        animate_ribbon(&mut scene, 0.0);
        let first = scene.counts();
        animate_ribbon(&mut scene, 1.7);
        let second = scene.counts();

        assert!(first.line_vertices > base.line_vertices);
        assert_eq!(first, second);
        assert!(!scene.is_line_open());
    }
}
