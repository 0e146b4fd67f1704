//! Perspective camera
//!
//! Stores position and an orthonormal basis. Camera space is +X right,
//! +Y down the screen, +Z into the scene, which is what `project` expects.

use super::math::{project, Vec3};

/// Camera state for 3D rendering
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,

    // Computed basis vectors
    pub basis_x: Vec3,
    pub basis_y: Vec3,
    pub basis_z: Vec3,
}

impl Camera {
    pub fn perspective(fov_y: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            fov_y,
            near,
            far,
            basis_x: Vec3::new(1.0, 0.0, 0.0),
            basis_y: Vec3::new(0.0, -1.0, 0.0),
            basis_z: Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// Point the camera at `target` keeping world +Y up
    pub fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.position).normalize();
        if forward == Vec3::ZERO {
            return;
        }
        // Looking straight up or down: pick any stable right vector
        let mut right = forward.cross(Vec3::UP);
        if right.len() < 1e-6 {
            right = Vec3::new(1.0, 0.0, 0.0);
        }
        self.basis_x = right.normalize();
        self.basis_z = forward;
        // Screen-down = forward x right
        self.basis_y = self.basis_z.cross(self.basis_x).normalize();
    }

    /// World position to camera space
    pub fn to_view(&self, world: Vec3) -> Vec3 {
        let rel = world - self.position;
        Vec3::new(rel.dot(self.basis_x), rel.dot(self.basis_y), rel.dot(self.basis_z))
    }

    /// Focal length in pixels for a framebuffer of the given height
    pub fn focal_length(&self, height: usize) -> f32 {
        height as f32 * 0.5 / (self.fov_y.to_radians() * 0.5).tan()
    }

    /// Project a world position into framebuffer space
    ///
    /// Returns `None` outside the near/far range.
    #[cfg(test)]
    pub fn world_to_screen(&self, world: Vec3, width: usize, height: usize) -> Option<Vec3> {
        let view = self.to_view(world);
        if view.z < self.near || view.z > self.far {
            return None;
        }
        Some(project(view, self.focal_length(height), width, height))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(75.0, 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_centers_target() {
        let mut cam = Camera::default();
        cam.position = Vec3::new(0.0, 2.0, 5.0);
        cam.look_at(Vec3::ZERO);

        let s = cam.world_to_screen(Vec3::ZERO, 200, 100).unwrap();
        assert!((s.x - 100.0).abs() < 1e-3);
        assert!((s.y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_up_is_screen_up() {
        let mut cam = Camera::default();
        cam.position = Vec3::new(0.0, 0.0, 5.0);
        cam.look_at(Vec3::ZERO);

        let above = cam.world_to_screen(Vec3::new(0.0, 1.0, 0.0), 200, 100).unwrap();
        let right = cam.world_to_screen(Vec3::new(1.0, 0.0, 0.0), 200, 100).unwrap();
        assert!(above.y < 50.0);
        assert!(right.x > 100.0);
    }

    #[test]
    fn test_behind_camera_is_rejected() {
        let mut cam = Camera::default();
        cam.position = Vec3::new(0.0, 0.0, 5.0);
        cam.look_at(Vec3::ZERO);
        assert!(cam.world_to_screen(Vec3::new(0.0, 0.0, 10.0), 200, 100).is_none());
    }
}
