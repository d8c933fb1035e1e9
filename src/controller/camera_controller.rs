use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};
use serde::Serialize;
use tracing::debug;

use crate::controller::input::DeviceProfile;
use crate::model::Camera;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// Free cursor; the camera ignores pointer deltas.
    Website,
    /// Pointer captured (or explicitly entered on touch devices); deltas rotate the view.
    Game,
}

impl CameraMode {
    /// Value published on the page as `body[data-mode]`.
    pub fn as_str(self) -> &'static str {
        match self {
            CameraMode::Website => "website",
            CameraMode::Game => "game",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Eye height above the player body's centre.
    pub eye_offset: f32,
    pub pointer_sensitivity: f32,
    pub touch_sensitivity: f32,
    /// Fraction of the pending rotation removed each frame.
    pub decay: f32,
    /// Pending rotation below this snaps to exactly zero.
    pub snap_threshold: f32,
    /// Polar angles measured from straight up.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            z_near: 0.1,
            z_far: 1000.0,
            eye_offset: 0.6,
            pointer_sensitivity: 0.1,
            touch_sensitivity: 0.3,
            decay: 0.2,
            snap_threshold: 0.005,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
        }
    }
}

/// Turns pointer/touch deltas into inertial yaw/pitch.
pub struct CameraController {
    config: CameraConfig,
    profile: DeviceProfile,
    mode: CameraMode,
    pending_yaw: f32,
    pending_pitch: f32,
    frame_delta: f32,
}

impl CameraController {
    pub fn new(config: CameraConfig, profile: DeviceProfile) -> Self {
        Self {
            config,
            profile,
            mode: CameraMode::Website,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            frame_delta: 0.0,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn profile(&self) -> DeviceProfile {
        self.profile
    }

    pub fn is_game_mode(&self) -> bool {
        self.mode == CameraMode::Game
    }

    /// Desktop transition: pointer lock acquired or lost.
    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.set_mode(if locked { CameraMode::Game } else { CameraMode::Website });
    }

    /// Touch devices have no pointer lock and switch explicitly.
    pub fn enter_game_mode(&mut self) {
        self.set_mode(CameraMode::Game);
    }

    pub fn exit_game_mode(&mut self) {
        self.set_mode(CameraMode::Website);
    }

    fn set_mode(&mut self, mode: CameraMode) {
        if self.mode != mode {
            debug!(?mode, "camera mode changed");
            self.mode = mode;
        }
    }

    /// Elapsed time of the last frame; scales deltas arriving before the next one.
    pub fn set_frame_delta(&mut self, delta: f32) {
        self.frame_delta = delta.max(0.0);
    }

    fn sensitivity(&self) -> f32 {
        match self.profile {
            DeviceProfile::Pointer => self.config.pointer_sensitivity,
            DeviceProfile::Touch => self.config.touch_sensitivity,
        }
    }

    /// Accumulate a raw movement delta (pixels). Ignored outside game mode.
    pub fn add_look(&mut self, delta: Vec2) {
        if !self.is_game_mode() {
            return;
        }
        let scale = self.frame_delta * self.sensitivity();
        self.pending_yaw += delta.x * scale;
        self.pending_pitch += delta.y * scale;
    }

    pub fn pending(&self) -> (f32, f32) {
        (self.pending_yaw, self.pending_pitch)
    }

    pub fn set_pending(&mut self, yaw: f32, pitch: f32) {
        self.pending_yaw = yaw;
        self.pending_pitch = pitch;
    }

    /// Apply the pending rotation to the camera, then decay it.
    pub fn update(&mut self, camera: &mut Camera) {
        let (yaw, pitch) = camera.yaw_pitch();
        let yaw = yaw - self.pending_yaw;
        let pitch = (pitch - self.pending_pitch).clamp(
            FRAC_PI_2 - self.config.max_polar_angle,
            FRAC_PI_2 - self.config.min_polar_angle,
        );
        camera.set_yaw_pitch(yaw, pitch);

        self.pending_yaw = self.decay(self.pending_yaw);
        self.pending_pitch = self.decay(self.pending_pitch);
    }

    fn decay(&self, value: f32) -> f32 {
        let next = value - value * self.config.decay;
        if next.abs() < self.config.snap_threshold {
            0.0
        } else {
            next
        }
    }

    /// The camera rides the player; it is never simulated on its own.
    pub fn pin_to(&self, camera: &mut Camera, body_position: Vec3) {
        camera.eye = body_position + Vec3::Y * self.config.eye_offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> CameraController {
        CameraController::new(CameraConfig::default(), DeviceProfile::Pointer)
    }

    #[test]
    fn mode_follows_pointer_lock_and_names_itself() {
        let mut control = controller();
        assert_eq!(control.mode().as_str(), "website");
        control.set_pointer_locked(true);
        assert_eq!(control.mode().as_str(), "game");
        control.set_pointer_locked(false);
        assert_eq!(control.mode().as_str(), "website");
    }

    #[test]
    fn website_mode_ignores_pointer_deltas() {
        let mut control = controller();
        control.set_frame_delta(1.0 / 60.0);
        control.add_look(Vec2::new(50.0, 20.0));
        assert_eq!(control.pending(), (0.0, 0.0));

        control.set_pointer_locked(true);
        control.add_look(Vec2::new(50.0, 20.0));
        let (yaw, pitch) = control.pending();
        assert!((yaw - 50.0 / 60.0 * 0.1).abs() < 1e-6);
        assert!((pitch - 20.0 / 60.0 * 0.1).abs() < 1e-6);
    }

    #[test]
    fn touch_profile_uses_its_own_sensitivity() {
        let mut control = CameraController::new(CameraConfig::default(), DeviceProfile::Touch);
        control.enter_game_mode();
        control.set_frame_delta(0.5);
        control.add_look(Vec2::new(2.0, 0.0));
        assert!((control.pending().0 - 2.0 * 0.5 * 0.3).abs() < 1e-6);
        control.exit_game_mode();
        assert_eq!(control.mode(), CameraMode::Website);
    }

    #[test]
    fn pending_rotation_decays_monotonically_to_exact_zero() {
        let mut control = controller();
        let mut camera = Camera::new(800, 600);
        control.set_pending(1.0, 0.0);

        let mut previous = 1.0f32;
        let mut ticks = 0;
        while control.pending().0 != 0.0 {
            control.update(&mut camera);
            let now = control.pending().0;
            assert!(now < previous);
            previous = now;
            ticks += 1;
            assert!(ticks <= 30, "decay did not terminate");
        }
        // 0.8^n drops below 0.005 on the 24th frame.
        assert_eq!(ticks, 24);
    }

    #[test]
    fn pending_yaw_is_subtracted_from_camera_yaw() {
        let mut control = controller();
        let mut camera = Camera::new(800, 600);
        control.set_pending(0.25, 0.0);
        control.update(&mut camera);
        let (yaw, pitch) = camera.yaw_pitch();
        assert!((yaw + 0.25).abs() < 1e-5);
        assert!(pitch.abs() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped_to_the_polar_bounds() {
        let mut control = controller();
        let mut camera = Camera::new(800, 600);
        control.set_pending(0.0, -10.0);
        control.update(&mut camera);
        let (_, pitch) = camera.yaw_pitch();
        assert!(pitch <= FRAC_PI_2 + 1e-4);
        assert!(camera.forward().y > 0.99);

        let mut narrow = CameraController::new(
            CameraConfig {
                min_polar_angle: 1.0,
                max_polar_angle: 2.0,
                ..CameraConfig::default()
            },
            DeviceProfile::Pointer,
        );
        let mut camera = Camera::new(800, 600);
        narrow.set_pending(0.0, 5.0);
        narrow.update(&mut camera);
        let (_, pitch) = camera.yaw_pitch();
        assert!((pitch - (FRAC_PI_2 - 2.0)).abs() < 1e-5);
    }

    #[test]
    fn camera_is_pinned_above_the_body() {
        let control = controller();
        let mut camera = Camera::new(800, 600);
        control.pin_to(&mut camera, Vec3::new(1.0, 1.05, -2.0));
        assert!(camera.eye.abs_diff_eq(Vec3::new(1.0, 1.65, -2.0), 1e-6));
    }
}
