use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use crate::model::scene_graph::Ray;

/// Perspective camera. Looks down -Z when `orientation` is identity.
pub struct Camera {
    pub eye: Vec3,
    pub orientation: Quat,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::new(0.0, 3.0, 7.0),
            orientation: Quat::IDENTITY,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect: aspect_of(width, height),
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn target(&self) -> Vec3 {
        self.eye + self.forward()
    }

    /// Roll-free (yaw, pitch) of the current orientation.
    pub fn yaw_pitch(&self) -> (f32, f32) {
        let (yaw, pitch, _roll) = self.orientation.to_euler(EulerRot::YXZ);
        (yaw, pitch)
    }

    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.orientation = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = aspect_of(width, height);
    }

    pub fn set_look_at(&mut self, target: Vec3) {
        let dir = (target - self.eye).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        let yaw = (-dir.x).atan2(-dir.z);
        let pitch = dir.y.clamp(-1.0, 1.0).asin();
        self.set_yaw_pitch(yaw, pitch);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.eye, self.forward(), self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// World-space ray through a point in normalized device coordinates
    /// (x right, y up, both in [-1, 1]). `Vec2::ZERO` is the crosshair.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_proj().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_camera_looks_down_negative_z() {
        let cam = Camera::new(800, 600);
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(cam.right().abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn yaw_pitch_round_trips_through_orientation() {
        let mut cam = Camera::new(800, 600);
        cam.set_yaw_pitch(0.7, -0.3);
        let (yaw, pitch) = cam.yaw_pitch();
        assert!((yaw - 0.7).abs() < 1e-5);
        assert!((pitch + 0.3).abs() < 1e-5);
    }

    #[test]
    fn positive_pitch_looks_up() {
        let mut cam = Camera::new(800, 600);
        cam.set_yaw_pitch(0.0, 0.5);
        assert!(cam.forward().y > 0.0);
    }

    #[test]
    fn quarter_turn_yaw_faces_negative_x() {
        let mut cam = Camera::new(800, 600);
        cam.set_yaw_pitch(FRAC_PI_2, 0.0);
        assert!(cam.forward().abs_diff_eq(Vec3::NEG_X, 1e-5));
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut cam = Camera::new(800, 600);
        cam.eye = Vec3::ZERO;
        let target = Vec3::new(3.0, 1.0, -2.0);
        cam.set_look_at(target);
        assert!(cam.forward().abs_diff_eq(target.normalize(), 1e-5));
    }

    #[test]
    fn center_ray_follows_forward() {
        let mut cam = Camera::new(1280, 720);
        cam.set_yaw_pitch(0.4, 0.2);
        let ray = cam.ray_from_ndc(Vec2::ZERO);
        assert!(ray.direction.abs_diff_eq(cam.forward(), 1e-3));
        assert!((ray.origin - cam.eye).length() < cam.z_near * 1.01);
    }
}
