//! Orbit camera controls with damping
//!
//! Rotation and pan input accumulates into deltas; each `update` applies a
//! `damping_factor` share of them and decays the rest, so motion eases out
//! over the following frames. Zoom applies immediately.

use std::f32::consts::PI;

use crate::rasterizer::{Camera, Vec3};

const ELEVATION_LIMIT: f32 = PI / 2.0 - 1e-3;
const DELTA_EPSILON: f32 = 1e-6;
const ZOOM_STEP: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrbitPose {
    target: Vec3,
    distance: f32,
    azimuth: f32,
    elevation: f32,
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub distance: f32,
    /// Radians about +Y, zero looking down -Z
    pub azimuth: f32,
    /// Radians above the horizon
    pub elevation: f32,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    azimuth_delta: f32,
    elevation_delta: f32,
    pan_delta: Vec3,
    saved: OrbitPose,
}

impl OrbitControls {
    /// Controls orbiting `target` from `position`
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.len().max(f32::EPSILON);
        let pose = OrbitPose {
            target,
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: (offset.y / distance).clamp(-1.0, 1.0).asin(),
        };
        Self {
            target,
            distance: pose.distance,
            azimuth: pose.azimuth,
            elevation: pose.elevation,
            damping_factor: 0.05,
            min_distance: 1.0,
            max_distance: 50.0,
            azimuth_delta: 0.0,
            elevation_delta: 0.0,
            pan_delta: Vec3::ZERO,
            saved: pose,
        }
    }

    /// Camera position for the current pose
    pub fn position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.elevation.cos() * self.azimuth.sin(),
            self.elevation.sin(),
            self.elevation.cos() * self.azimuth.cos(),
        );
        self.target + offset.scale(self.distance)
    }

    /// Mouse drag in pixels: a full viewport height is one turn
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.azimuth_delta -= 2.0 * PI * dx / h;
        self.elevation_delta += 2.0 * PI * dy / h;
    }

    /// Wheel ticks, positive zooms in
    pub fn zoom(&mut self, ticks: f32) {
        self.distance = (self.distance * ZOOM_STEP.powf(ticks)).clamp(self.min_distance, self.max_distance);
    }

    /// Pan the target in the view plane by a pixel drag
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32, fov_y_degrees: f32) {
        let pos = self.position();
        let forward = (self.target - pos).normalize();
        let right = forward.cross(Vec3::UP).normalize();
        let up = right.cross(forward);
        let world_per_pixel =
            2.0 * self.distance * (fov_y_degrees.to_radians() / 2.0).tan() / viewport_height.max(1.0);
        self.pan_delta += right.scale(-dx * world_per_pixel) + up.scale(dy * world_per_pixel);
    }

    /// Advance damping one frame. Returns true if the pose moved.
    pub fn update(&mut self) -> bool {
        let f = self.damping_factor;
        let before = (self.azimuth, self.elevation, self.target);

        self.azimuth += self.azimuth_delta * f;
        self.elevation = (self.elevation + self.elevation_delta * f).clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        self.target += self.pan_delta.scale(f);
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);

        self.azimuth_delta *= 1.0 - f;
        self.elevation_delta *= 1.0 - f;
        self.pan_delta = self.pan_delta.scale(1.0 - f);
        if self.azimuth_delta.abs() < DELTA_EPSILON {
            self.azimuth_delta = 0.0;
        }
        if self.elevation_delta.abs() < DELTA_EPSILON {
            self.elevation_delta = 0.0;
        }
        if self.pan_delta.len() < DELTA_EPSILON {
            self.pan_delta = Vec3::ZERO;
        }

        before != (self.azimuth, self.elevation, self.target)
    }

    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.position();
        camera.look_at(self.target);
    }

    /// Remember the current pose for `reset`
    pub fn save_state(&mut self) {
        self.saved = OrbitPose {
            target: self.target,
            distance: self.distance,
            azimuth: self.azimuth,
            elevation: self.elevation,
        };
    }

    /// Return to the saved pose and drop pending motion
    pub fn reset(&mut self) {
        self.target = self.saved.target;
        self.distance = self.saved.distance;
        self.azimuth = self.saved.azimuth;
        self.elevation = self.saved.elevation;
        self.azimuth_delta = 0.0;
        self.elevation_delta = 0.0;
        self.pan_delta = Vec3::ZERO;
    }
}
