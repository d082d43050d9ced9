/// Directional light used by the shadow pass

use glam::{Mat4, Vec3};
use crate::camera::flip_clip_y;

/// Fixed directional light and its orthographic shadow frustum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTransform {
    pub direction: Vec3,
    pub target: Vec3,
    /// Distance from the target back along `direction` to the light origin
    pub distance: f32,
    /// Half extent of the square orthographic volume
    pub half_extent: f32,
    pub near: f32,
    pub far: f32,
}

impl LightTransform {
    /// The engine's only light: straight down -Z onto a point 5 units ahead
    pub fn fixed() -> Self {
        Self {
            direction: Vec3::new(0.0, 0.0, -1.0),
            target: Vec3::new(0.0, 0.0, -5.0),
            distance: 10.0,
            half_extent: 10.0,
            near: 0.1,
            far: 30.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.target - self.direction.normalize() * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Orthographic projection with Vulkan clip conventions (Y down, depth 0..1)
    pub fn projection(&self) -> Mat4 {
        let e = self.half_extent;
        flip_clip_y(Mat4::orthographic_rh(-e, e, -e, e, self.near, self.far))
    }

    /// Combined `projection * view`
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

impl Default for LightTransform {
    fn default() -> Self {
        Self::fixed()
    }
}
