//! Camera and view management.

use glam::{Mat4, Vec3};

/// Default vertical field of view, in degrees.
pub const DEFAULT_FOV_DEGREES: f32 = 60.0;
/// Default near clipping plane.
pub const DEFAULT_NEAR: f32 = 0.1;
/// Default far clipping plane.
pub const DEFAULT_FAR: f32 = 100.0;
/// Default distance from the origin along +Z.
pub const DEFAULT_DISTANCE: f32 = 10.0;

/// A perspective camera looking at a target point.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Camera {
    /// Creates the default camera: on +Z looking at the origin.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, DEFAULT_DISTANCE),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: DEFAULT_FOV_DEGREES.to_radians(),
            aspect_ratio,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    /// Sets the aspect ratio. Non-finite or non-positive values are ignored.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect_ratio = aspect;
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix (wgpu depth range 0..1).
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_camera() {
        let camera = Camera::new(16.0 / 9.0);
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(camera.fov, std::f32::consts::FRAC_PI_3);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 100.0);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let camera = Camera::new(1.5);
        let clip = camera.view_projection_matrix() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_aspect_ratio_rejects_invalid() {
        let mut camera = Camera::new(2.0);
        camera.set_aspect_ratio(0.0);
        camera.set_aspect_ratio(f32::NAN);
        assert_eq!(camera.aspect_ratio, 2.0);
        camera.set_aspect_ratio(0.5);
        assert_eq!(camera.aspect_ratio, 0.5);
    }
}
