// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Perspective camera state for scene rendering.

use glam::{Mat4, Vec3};

/// Aspect ratio of a `width × height` box.
///
/// A zero-height box yields `1.0` so the projection never sees NaN/Infinity.
pub fn aspect_of(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Camera state for rendering.
///
/// Position and target are free for controls to mutate. The aspect ratio is
/// private: it only changes through [`CameraState::set_aspect`], which always
/// recomputes the projection matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    /// Camera position in world space.
    pub position: [f32; 3],
    /// Look-at target in world space.
    pub target: [f32; 3],
    /// Up vector.
    pub up: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    aspect: f32,
    projection: Mat4,
    projection_revision: u64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::perspective(50.0, 1.0, 0.1, 2000.0)
    }
}

impl CameraState {
    /// Build a perspective camera at `[0, 0, 5]` looking at the origin.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            fov_y_degrees,
            near,
            far,
            aspect,
            projection: Mat4::IDENTITY,
            projection_revision: 0,
        };
        camera.update_projection();
        camera
    }

    /// Builder-style position setter.
    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    /// Current aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Current projection matrix.
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Number of times the projection has been recomputed since construction.
    pub fn projection_revision(&self) -> u64 {
        self.projection_revision
    }

    /// Set the aspect ratio and recompute the projection.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        self.update_projection();
    }

    /// Recompute the projection matrix from fov/aspect/near/far.
    pub fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh_gl(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        );
        self.projection_revision += 1;
    }

    /// View matrix looking from `position` at `target`.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(
            Vec3::from_array(self.position),
            Vec3::from_array(self.target),
            Vec3::from_array(self.up),
        )
    }

    /// Combined view-projection matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aspect_of_handles_degenerate_boxes() {
        assert_relative_eq!(aspect_of(800, 600), 800.0 / 600.0);
        assert_relative_eq!(aspect_of(800, 0), 1.0);
        assert_relative_eq!(aspect_of(0, 600), 1.0);
    }

    #[test]
    fn set_aspect_recomputes_projection() {
        let mut cam = CameraState::perspective(40.0, 1.0, 1.0, 100.0);
        let before = cam.projection();
        let rev = cam.projection_revision();
        cam.set_aspect(2.0);
        assert_relative_eq!(cam.aspect(), 2.0);
        assert_eq!(cam.projection_revision(), rev + 1);
        assert_ne!(before, cam.projection());
        // x scale is f / aspect for a GL perspective.
        let f = 1.0 / (40f32.to_radians() / 2.0).tan();
        assert_relative_eq!(cam.projection().x_axis.x, f / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn invalid_aspect_falls_back_to_square() {
        let mut cam = CameraState::default();
        cam.set_aspect(f32::NAN);
        assert_relative_eq!(cam.aspect(), 1.0);
        cam.set_aspect(-3.0);
        assert_relative_eq!(cam.aspect(), 1.0);
    }
}
