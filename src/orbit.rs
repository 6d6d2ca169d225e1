//! Built-in orbit/zoom camera controller.
//!
//! Pointer drags orbit the camera around the origin, the wheel zooms along
//! the origin-to-camera direction. Spherical state is re-derived from the
//! camera's live position on every drag start instead of being tracked
//! incrementally across drags; external camera motion between drags (scripts,
//! `set_camera`) is therefore picked up transparently and floating-point
//! drift cannot accumulate.

use glam::Vec3;

use crate::camera::Camera;

/// Radians of orbit per pixel of pointer movement.
const ROTATE_SPEED: f32 = 0.005;

/// World units moved per wheel event.
const ZOOM_STEP: f32 = 5.0;

/// Keep-away margin from the poles for the polar angle.
const PHI_EPSILON: f32 = 0.1;

/// Orbit state derived from the camera position at drag start.
///
/// `phi` is the polar angle from the vertical axis, `theta` the azimuth
/// about it. Invariant after any update: `phi` stays in
/// `[PHI_EPSILON, PI - PHI_EPSILON]` and `distance >= 0`.
#[derive(Debug, Clone, Default)]
pub struct OrbitState {
    pub distance: f32,
    pub theta: f32,
    pub phi: f32,
    pub dragging: bool,
    pub last_pointer: (f32, f32),
}

#[derive(Debug, Default)]
pub struct CameraController {
    state: OrbitState,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &OrbitState {
        &self.state
    }

    /// Begin a drag: capture the pointer and resync spherical state from the
    /// camera's current position.
    pub fn pointer_down(&mut self, camera: &Camera, x: f32, y: f32) {
        self.state.dragging = true;
        self.state.last_pointer = (x, y);
        self.state.distance = camera.position.length();

        let (theta, phi) = spherical_from_position(camera.position);
        self.state.theta = theta;
        self.state.phi = phi;
    }

    /// End the drag. Pointer position is not cleared; the next drag resyncs.
    pub fn pointer_up(&mut self) {
        self.state.dragging = false;
    }

    /// Orbit the camera while dragging. A no-op when not dragging.
    pub fn pointer_move(&mut self, camera: &mut Camera, x: f32, y: f32) {
        if !self.state.dragging {
            return;
        }

        let dx = x - self.state.last_pointer.0;
        let dy = y - self.state.last_pointer.1;

        self.state.theta -= dx * ROTATE_SPEED;
        self.state.phi -= dy * ROTATE_SPEED;
        self.state.phi = self
            .state
            .phi
            .clamp(PHI_EPSILON, std::f32::consts::PI - PHI_EPSILON);

        let d = self.state.distance;
        let (theta, phi) = (self.state.theta, self.state.phi);
        camera.position = Vec3::new(
            d * phi.sin() * theta.sin(),
            d * phi.cos(),
            d * phi.sin() * theta.cos(),
        );
        camera.look_at(Vec3::ZERO);

        self.state.last_pointer = (x, y);
    }

    /// Zoom along the origin-to-camera direction: positive delta moves the
    /// camera `ZOOM_STEP` units further out, otherwise `ZOOM_STEP` closer.
    /// The step is deliberately unclamped, so close-in zooms can cross the
    /// origin.
    pub fn wheel(&mut self, camera: &mut Camera, delta_y: f32) {
        let direction = camera.position.normalize_or_zero();
        if delta_y > 0.0 {
            camera.position += direction * ZOOM_STEP;
        } else {
            camera.position -= direction * ZOOM_STEP;
        }
    }
}

/// Spherical angles `(theta, phi)` of a position, with `phi` measured from
/// the vertical axis and `theta` the azimuth about it. A zero-length position
/// yields `(0, 0)`.
fn spherical_from_position(position: Vec3) -> (f32, f32) {
    let radius = position.length();
    if radius == 0.0 {
        return (0.0, 0.0);
    }
    let theta = position.x.atan2(position.z);
    let phi = (position.y / radius).clamp(-1.0, 1.0).acos();
    (theta, phi)
}
