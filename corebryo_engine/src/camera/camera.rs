/// Camera - first-person fly camera driving the main and skybox views
///
/// Orientation is kept as yaw/pitch in degrees; the basis vectors are rebuilt
/// whenever the angles change.

use glam::{Mat4, Vec3};
use crate::input::{InputAction, InputFrame};
use crate::renderer::Extent2D;

/// Pitch limit in degrees, avoids flipping over the poles
pub const MAX_PITCH: f32 = 89.0;

/// Convert a right-handed GL-style clip transform to Vulkan's Y-down clip space
pub fn flip_clip_y(projection: Mat4) -> Mat4 {
    Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0)) * projection
}

/// First-person camera
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    movement_speed: f32,
    /// Vertical field of view in degrees
    zoom: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Camera at `position` looking down -Z
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            movement_speed: 15.0,
            zoom: 45.0,
            near: 0.1,
            far: 100.0,
        };
        camera.update_vectors();
        camera
    }

    // ===== GETTERS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Vertical field of view in degrees
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    // ===== SETTERS =====

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set yaw/pitch in degrees; pitch is clamped to ±`MAX_PITCH`
    pub fn set_rotation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.update_vectors();
    }

    pub fn set_movement_speed(&mut self, speed: f32) {
        self.movement_speed = speed;
    }

    // ===== UPDATE =====

    /// Apply one frame of resolved input
    ///
    /// Movement is scaled by `delta_time` and doubled while `FastMove` is held.
    /// Look axes accumulate into yaw/pitch.
    pub fn update(&mut self, input: &InputFrame, delta_time: f32) {
        let boost = if input.action(InputAction::FastMove) { 2.0 } else { 1.0 };
        let speed = self.movement_speed * delta_time * boost;

        if input.action(InputAction::MoveForward) {
            self.position += self.front * speed;
        }
        if input.action(InputAction::MoveBackward) {
            self.position -= self.front * speed;
        }
        if input.action(InputAction::MoveLeft) {
            self.position -= self.right * speed;
        }
        if input.action(InputAction::MoveRight) {
            self.position += self.right * speed;
        }

        self.set_rotation(self.yaw + input.look.x, self.pitch + input.look.y);
    }

    // ===== MATRICES =====

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Perspective projection for the main pass (near 0.1, far 100)
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        flip_clip_y(Mat4::perspective_rh(self.zoom.to_radians(), aspect, self.near, self.far))
    }

    /// `projection * view * model` for the given target extent
    pub fn mvp(&self, model: Mat4, extent: Extent2D) -> Mat4 {
        self.projection_matrix(extent.aspect_ratio()) * self.view_matrix() * model
    }

    /// View matrix with the translation removed, so the sky has no parallax
    pub fn rotation_only_view(&self) -> Mat4 {
        let view = Mat4::look_at_rh(Vec3::ZERO, self.front, self.up);
        Mat4::from_mat3(glam::Mat3::from_mat4(view))
    }

    /// Sky projection: same field of view, far plane pushed to 1000
    pub fn skybox_view_projection(&self, extent: Extent2D) -> Mat4 {
        let projection = flip_clip_y(Mat4::perspective_rh(
            self.zoom.to_radians(),
            extent.aspect_ratio(),
            0.1,
            1000.0,
        ));
        projection * self.rotation_only_view()
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
