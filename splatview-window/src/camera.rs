use glam::{Mat4, Vec3};
use splatview_gpu::ViewProjection;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_3, PI, TAU};
use tracing::debug;

pub const MIN_DISTANCE: f32 = 0.5;
pub const MAX_DISTANCE: f32 = 10.0;
pub const DEFAULT_DISTANCE: f32 = 3.0;

/// Radians of rotation per pixel of drag.
pub const DEFAULT_DRAG_SENSITIVITY: f32 = 0.01;

/// Orbit camera state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Distance from the origin, within [`MIN_DISTANCE`, `MAX_DISTANCE`].
    pub distance: f32,
    /// Pitch in radians, within [-π/2, π/2].
    pub rotation_x: f32,
    /// Yaw in radians. Unbounded.
    pub rotation_y: f32,
}

impl CameraState {
    /// State restored by a camera reset.
    pub const RESET: Self = Self {
        distance: DEFAULT_DISTANCE,
        rotation_x: 0.0,
        rotation_y: 0.0,
    };

    /// `translate(0, 0, -distance) * rotateX(rotation_x) * rotateY(rotation_y)`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_rotation_x(self.rotation_x)
            * Mat4::from_rotation_y(self.rotation_y)
    }

    /// Component-wise interpolation.
    pub fn lerp(&self, target: &Self, t: f32) -> Self {
        Self {
            distance: self.distance + (target.distance - self.distance) * t,
            rotation_x: self.rotation_x + (target.rotation_x - self.rotation_x) * t,
            rotation_y: self.rotation_y + (target.rotation_y - self.rotation_y) * t,
        }
    }

    /// Same orientation with yaw folded into [-π, π).
    pub fn with_wrapped_yaw(mut self) -> Self {
        self.rotation_y = (self.rotation_y + PI).rem_euclid(TAU) - PI;
        self
    }

    fn clamped(mut self) -> Self {
        self.distance = self.distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.rotation_x = self.rotation_x.clamp(-FRAC_PI_2, FRAC_PI_2);
        self
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::RESET
    }
}

/// Perspective projection parameters. The aspect ratio is supplied per call
/// so it always matches the live drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(fov_y: f32, near: f32, far: f32) -> Self {
        Self { fov_y, near, far }
    }

    /// Right-handed perspective with a [0, 1] depth range.
    pub fn matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(FRAC_PI_3, 0.1, 100.0)
    }
}

/// Turns drag and zoom gestures into clamped [`CameraState`] updates.
#[derive(Debug, Clone)]
pub struct CameraController {
    state: CameraState,
    projection: Projection,
    drag_sensitivity: f32,
}

impl CameraController {
    pub fn new(drag_sensitivity: f32) -> Self {
        Self {
            state: CameraState::RESET,
            projection: Projection::default(),
            drag_sensitivity,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Replace the state, clamping it into the valid range.
    pub fn set_state(&mut self, state: CameraState) {
        self.state = state.clamped();
    }

    /// Rotate by a drag of `(dx, dy)` pixels.
    pub fn apply_drag(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            debug!("Ignoring non-finite drag ({dx}, {dy})");
            return;
        }
        self.state.rotation_y += dx * self.drag_sensitivity;
        self.state.rotation_x =
            (self.state.rotation_x + dy * self.drag_sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    /// Divide the distance by a magnification factor; `factor > 1` moves closer.
    pub fn apply_zoom(&mut self, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            debug!("Ignoring invalid zoom factor {factor}");
            return;
        }
        self.state.distance = (self.state.distance / factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn reset(&mut self) {
        self.state = CameraState::RESET;
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.state.view_matrix()
    }

    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        self.projection.matrix(width, height)
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_SENSITIVITY)
    }
}

impl ViewProjection for CameraController {
    fn view_projection(&self, width: u32, height: u32) -> Mat4 {
        self.projection_matrix(width, height) * self.view_matrix()
    }
}

/// Eased move between two camera states.
#[derive(Debug, Clone, Copy)]
pub struct CameraTransition {
    from: CameraState,
    to: CameraState,
    duration: f32,
    elapsed: f32,
}

impl CameraTransition {
    /// Yaw of `from` is wrapped first so the animation takes the short way round.
    pub fn new(from: CameraState, to: CameraState, duration: f32) -> Self {
        Self {
            from: from.with_wrapped_yaw(),
            to,
            duration,
            elapsed: 0.0,
        }
    }

    /// Step by `dt` seconds and return the interpolated state.
    pub fn advance(&mut self, dt: f32) -> CameraState {
        self.elapsed += dt.max(0.0);
        let t = if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        };
        self.from.lerp(&self.to, smoothstep(t))
    }

    pub fn is_finished(&self) -> bool {
        self.duration <= 0.0 || self.elapsed >= self.duration
    }

    pub fn target(&self) -> CameraState {
        self.to
    }
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_default_view_is_pure_translation() {
        let camera = CameraController::default();
        let expected = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
        assert!(camera.view_matrix().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn test_projection_matches_explicit_form() {
        let (width, height) = (1280u32, 720u32);
        let (near, far) = (0.1f32, 100.0f32);
        let aspect = width as f32 / height as f32;
        let y = 1.0 / (FRAC_PI_3 / 2.0).tan();
        let x = y / aspect;
        let z = far / (near - far);
        let expected = Mat4::from_cols(
            Vec4::new(x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, z, -1.0),
            Vec4::new(0.0, 0.0, z * near, 0.0),
        );
        let actual = CameraController::default().projection_matrix(width, height);
        assert!(actual.abs_diff_eq(expected, EPS));
    }

    #[test]
    fn test_view_projection_is_projection_times_view() {
        let mut camera = CameraController::default();
        camera.apply_drag(40.0, -25.0);
        camera.apply_zoom(1.5);
        let expected = camera.projection_matrix(800, 600) * camera.view_matrix();
        assert!(camera.view_projection(800, 600).abs_diff_eq(expected, EPS));
    }

    #[test]
    fn test_aspect_follows_drawable_size() {
        let camera = CameraController::default();
        let wide = camera.projection_matrix(2000, 1000);
        let square = camera.projection_matrix(1000, 1000);
        assert!((wide.x_axis.x * 2.0 - square.x_axis.x).abs() < EPS);
        assert_eq!(wide.y_axis.y, square.y_axis.y);
    }

    #[test]
    fn test_drag_accumulates_rotation() {
        let mut camera = CameraController::default();
        camera.apply_drag(10.0, 20.0);
        let state = camera.state();
        assert!((state.rotation_y - 0.1).abs() < EPS);
        assert!((state.rotation_x - 0.2).abs() < EPS);
    }

    #[test]
    fn test_rotation_x_stays_clamped_after_any_drags() {
        let mut camera = CameraController::default();
        let drags = [
            (0.0, 500.0),
            (3.0, -1000.0),
            (-7.0, 12.5),
            (0.0, 157.0),
            (900.0, -0.5),
            (0.0, -10_000.0),
        ];
        for (dx, dy) in drags {
            camera.apply_drag(dx, dy);
            let rx = camera.state().rotation_x;
            assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&rx), "rotation_x = {rx}");
        }
    }

    #[test]
    fn test_rotation_y_is_unbounded() {
        let mut camera = CameraController::default();
        for _ in 0..10 {
            camera.apply_drag(1000.0, 0.0);
        }
        assert!((camera.state().rotation_y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_then_inverse_restores_distance() {
        let mut camera = CameraController::default();
        for factor in [1.1f32, 0.8, 1.7, 2.0] {
            let before = camera.state().distance;
            camera.apply_zoom(factor);
            camera.apply_zoom(1.0 / factor);
            assert!((camera.state().distance - before).abs() < 1e-4);
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = CameraController::default();
        camera.apply_zoom(100.0);
        assert_eq!(camera.state().distance, MIN_DISTANCE);
        camera.apply_zoom(0.001);
        assert_eq!(camera.state().distance, MAX_DISTANCE);
    }

    #[test]
    fn test_invalid_zoom_factors_are_ignored() {
        let mut camera = CameraController::default();
        for factor in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            camera.apply_zoom(factor);
            assert_eq!(camera.state().distance, DEFAULT_DISTANCE);
        }
    }

    #[test]
    fn test_reset_restores_defaults_from_any_state() {
        let mut camera = CameraController::default();
        camera.apply_drag(123.0, -45.0);
        camera.apply_zoom(0.3);
        camera.reset();
        assert_eq!(camera.state(), CameraState::RESET);
        assert_eq!(
            (camera.state().distance, camera.state().rotation_x, camera.state().rotation_y),
            (3.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_set_state_clamps() {
        let mut camera = CameraController::default();
        camera.set_state(CameraState {
            distance: 50.0,
            rotation_x: 4.0,
            rotation_y: 9.0,
        });
        let state = camera.state();
        assert_eq!(state.distance, MAX_DISTANCE);
        assert_eq!(state.rotation_x, FRAC_PI_2);
        assert_eq!(state.rotation_y, 9.0);
    }

    #[test]
    fn test_wrapped_yaw_keeps_view() {
        let state = CameraState {
            distance: 2.0,
            rotation_x: 0.3,
            rotation_y: 20.0,
        };
        let wrapped = state.with_wrapped_yaw();
        assert!((-PI..PI).contains(&wrapped.rotation_y));
        assert!(state.view_matrix().abs_diff_eq(wrapped.view_matrix(), 1e-4));
    }

    #[test]
    fn test_transition_eases_to_target() {
        let from = CameraState {
            distance: 8.0,
            rotation_x: 1.0,
            rotation_y: -2.0,
        };
        let mut transition = CameraTransition::new(from, CameraState::RESET, 0.4);
        let start = transition.advance(0.0);
        assert!((start.distance - 8.0).abs() < EPS);

        let middle = transition.advance(0.2);
        assert!((middle.distance - 5.5).abs() < EPS);
        assert!(!transition.is_finished());

        let end = transition.advance(0.3);
        assert!(transition.is_finished());
        assert!((end.distance - DEFAULT_DISTANCE).abs() < EPS);
        assert!(end.rotation_x.abs() < EPS);
        assert!(end.rotation_y.abs() < EPS);
    }

    #[test]
    fn test_zero_duration_transition_finishes_immediately() {
        let mut transition =
            CameraTransition::new(CameraState::RESET, CameraState::RESET, 0.0);
        assert!(transition.is_finished());
        assert_eq!(transition.advance(0.0), CameraState::RESET);
    }
}
