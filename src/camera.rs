//! Perspective camera.
//!
//! A plain look-at camera: position, target, up, and the usual frustum
//! parameters. The projection matrix is cached and recomputed explicitly via
//! [`Camera::update_projection_matrix`] whenever `fov` or `aspect` change, so
//! the aspect invariant (`aspect == width / height`) is maintained by the
//! player, not silently here.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use glam::{Mat4, Vec3};

#[derive(Debug, Clone)]
pub struct Camera {
    /// Position in world space.
    pub position: Vec3,
    /// Look-at target.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Width / height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Cached projection, valid after `update_projection_matrix`.
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the camera at a world-space target.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Set the aspect ratio. The caller recomputes the projection afterwards.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Recompute the cached projection matrix from the current parameters.
    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    /// View matrix derived from position, target, and up.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }
}

/// Shared handle to the camera, exposed to scripts, the camera controller,
/// and the renderer alike.
#[derive(Debug, Clone)]
pub struct CameraHandle(Rc<RefCell<Camera>>);

impl CameraHandle {
    pub fn new(camera: Camera) -> Self {
        Self(Rc::new(RefCell::new(camera)))
    }

    pub fn borrow(&self) -> Ref<'_, Camera> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Camera> {
        self.0.borrow_mut()
    }

    /// Replace the camera contents, keeping existing aliases valid.
    pub fn replace(&self, camera: Camera) {
        *self.0.borrow_mut() = camera;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_updates_projection() {
        let mut camera = Camera::new();
        let before = camera.projection;

        camera.set_aspect(16.0 / 9.0);
        camera.update_projection_matrix();
        assert_ne!(camera.projection, before);
    }

    #[test]
    fn test_view_matrix_looks_at_target() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(5.0, 5.0, 5.0);
        camera.look_at(Vec3::ZERO);

        let view = camera.view_matrix();
        let origin_in_view = view.transform_point3(Vec3::ZERO);
        // Origin should be in front of the camera (negative Z in view space).
        assert!(origin_in_view.z < 0.0);
    }

    #[test]
    fn test_handle_replace_keeps_aliases() {
        let handle = CameraHandle::new(Camera::new());
        let alias = handle.clone();

        let mut replacement = Camera::new();
        replacement.position = Vec3::new(1.0, 2.0, 3.0);
        handle.replace(replacement);

        assert_eq!(alias.borrow().position, Vec3::new(1.0, 2.0, 3.0));
    }
}
