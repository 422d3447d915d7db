//! Render camera.

use glam::{Mat4, Vec3};

/// Camera state consumed by the batch renderer.
///
/// The renderer only reads the composed view-projection matrix and the
/// world position (used for the eye/light uniforms and translucency
/// sorting); projection management stays with the embedder.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// World-to-view matrix.
    pub view: Mat4,
    /// View-to-clip matrix.
    pub projection: Mat4,
    /// World-space camera position.
    pub position: Vec3,
}

impl Camera {
    /// Create a camera from explicit matrices.
    pub fn new(view: Mat4, projection: Mat4, position: Vec3) -> Self {
        Self {
            view,
            projection,
            position,
        }
    }

    /// Create a camera looking from `eye` at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3, projection: Mat4) -> Self {
        Self {
            view: Mat4::look_at_rh(eye, target, up),
            projection,
            position: eye,
        }
    }

    /// The composed view-projection matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Distance from the camera to a world-space point.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            position: Vec3::ZERO,
        }
    }
}
