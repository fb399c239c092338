use glam::{Mat4, Vec3, Vec4};

use crate::coords::Viewport;

/// Camera orbiting a centre point.
///
/// `transform` = `intrinsic * T(distance) * R⁻¹ * T(position)⁻¹`, where
/// - `position` is the orbit centre,
/// - `rotation` is (pitch, yaw, roll) in radians, applied roll, pitch, yaw,
/// - `distance` pulls the eye back along its view axis.
///
/// Clip depth is wgpu's `[0, 1]` range.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub position: Vec3,
    pub rotation: Vec3,
    pub distance: f32,

    /// Keep the intrinsic aspect ratio when the viewport shape differs from it.
    pub preserve_aspect_ratio: bool,

    intrinsic: Mat4,
    /// `fx / fy` of the current intrinsics.
    aspect_ratio: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            distance: 0.0,
            preserve_aspect_ratio: true,
            intrinsic: Mat4::IDENTITY,
            aspect_ratio: 1.0,
        };
        camera.perspective_fov(60f32.to_radians(), 60f32.to_radians(), 0.1, 100.0);
        camera
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Perspective from horizontal and vertical field of view (radians).
    pub fn perspective_fov(&mut self, hfov: f32, vfov: f32, near: f32, far: f32) {
        let fx = 0.5 / (hfov * 0.5).tan();
        let fy = 0.5 / (vfov * 0.5).tan();
        self.perspective(fx, fy, 0.5, 0.5, near, far);
    }

    /// Perspective from focal lengths and principal point normalised to the viewport
    /// (`cx = cy = 0.5` is the centre).
    pub fn perspective(&mut self, fx: f32, fy: f32, cx: f32, cy: f32, near: f32, far: f32) {
        let depth = far / (near - far);
        self.intrinsic = Mat4::from_cols(
            Vec4::new(2.0 * fx, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 * fy, 0.0, 0.0),
            Vec4::new(2.0 * cx - 1.0, 2.0 * cy - 1.0, depth, -1.0),
            Vec4::new(0.0, 0.0, depth * near, 0.0),
        );
        self.aspect_ratio = fx / fy;
    }

    pub fn intrinsic(&self) -> Mat4 {
        self.intrinsic
    }

    /// World to view space.
    pub fn view(&self) -> Mat4 {
        let inverse_rotation = Mat4::from_rotation_z(-self.rotation.z)
            * Mat4::from_rotation_x(-self.rotation.x)
            * Mat4::from_rotation_y(-self.rotation.y);

        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * inverse_rotation
            * Mat4::from_translation(-self.position)
    }

    /// World to clip space for a viewport of the given pixel size.
    pub fn transform(&self, viewport: Viewport) -> Mat4 {
        if !viewport.is_valid() {
            return self.intrinsic * self.view();
        }

        let mut width = viewport.width;
        let mut height = viewport.height;
        if self.preserve_aspect_ratio {
            if height / width < self.aspect_ratio {
                width = height / self.aspect_ratio;
            } else {
                height = width * self.aspect_ratio;
            }
        }

        // only the focal terms; the principal point stays put
        let mut intrinsic = self.intrinsic;
        intrinsic.x_axis.x *= width / viewport.width;
        intrinsic.y_axis.y *= height / viewport.height;
        intrinsic * self.view()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;

    fn ndc(m: Mat4, p: Vec3) -> Vec3 {
        let clip = m * p.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn right_angle_fov_gives_unit_focal_scale() {
        let mut camera = OrbitCamera::new();
        camera.perspective_fov(FRAC_PI_2, FRAC_PI_2, 0.1, 10.0);
        let m = camera.intrinsic();
        assert!((m.x_axis.x - 1.0).abs() < 1e-6);
        assert!((m.y_axis.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orbit_centre_projects_to_screen_centre() {
        let camera = OrbitCamera {
            position: Vec3::new(3.0, -1.0, 2.0),
            rotation: Vec3::new(0.3, 1.1, 0.2),
            distance: 5.0,
            ..OrbitCamera::default()
        };
        let p = ndc(camera.transform(Viewport::new(800.0, 600.0)), camera.position);
        assert!(p.x.abs() < 1e-5 && p.y.abs() < 1e-5, "{p:?}");
        assert!(p.z > 0.0 && p.z < 1.0);
    }

    #[test]
    fn depth_spans_zero_to_one() {
        let mut camera = OrbitCamera::new();
        camera.perspective_fov(FRAC_PI_2, FRAC_PI_2, 1.0, 10.0);
        let m = camera.transform(Viewport::new(100.0, 100.0));
        assert!(ndc(m, Vec3::new(0.0, 0.0, -1.0)).z.abs() < 1e-5);
        assert!((ndc(m, Vec3::new(0.0, 0.0, -10.0)).z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn wide_viewport_keeps_square_aspect() {
        let camera = OrbitCamera {
            distance: 4.0,
            ..OrbitCamera::default()
        };
        let square = ndc(camera.transform(Viewport::new(100.0, 100.0)), Vec3::new(1.0, 1.0, 0.0));
        let wide = ndc(camera.transform(Viewport::new(200.0, 100.0)), Vec3::new(1.0, 1.0, 0.0));

        assert!((wide.x - square.x * 0.5).abs() < 1e-5);
        assert!((wide.y - square.y).abs() < 1e-5);
    }

    #[test]
    fn aspect_fit_keeps_principal_point() {
        let mut camera = OrbitCamera::new();
        camera.perspective(1.0, 1.0, 0.75, 0.25, 0.1, 10.0);

        let m = camera.transform(Viewport::new(200.0, 100.0));
        assert!((m.x_axis.x - 1.0).abs() < 1e-6);
        assert!((m.y_axis.y - 2.0).abs() < 1e-6);
        assert!((m.z_axis.x - 0.5).abs() < 1e-6);
        assert!((m.z_axis.y + 0.5).abs() < 1e-6);
    }

    #[test]
    fn aspect_preservation_can_be_disabled() {
        let camera = OrbitCamera {
            distance: 4.0,
            preserve_aspect_ratio: false,
            ..OrbitCamera::default()
        };
        let square = ndc(camera.transform(Viewport::new(100.0, 100.0)), Vec3::new(1.0, 1.0, 0.0));
        let wide = ndc(camera.transform(Viewport::new(200.0, 100.0)), Vec3::new(1.0, 1.0, 0.0));
        assert!(wide.abs_diff_eq(square, 1e-6));
    }

    #[test]
    fn yaw_turns_the_view() {
        let camera = OrbitCamera {
            rotation: Vec3::new(0.0, FRAC_PI_2, 0.0),
            ..OrbitCamera::default()
        };
        // after a quarter yaw the camera looks down -X
        let v = camera.view().transform_point3(Vec3::new(-2.0, 0.0, 0.0));
        assert!(v.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5), "{v:?}");
    }
}
