/// Scene components

use glam::{Mat4, Vec3};
use crate::renderer::{Material, MeshBuffers};

/// Position, Euler rotation in radians, and per-axis scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl TransformComponent {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    /// Translate, then rotate Z, Y, X, then scale
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_scale(self.scale)
    }
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Mesh reference; an empty component still produces a (skipped) draw item
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeshComponent {
    pub mesh: Option<MeshBuffers>,
}

impl MeshComponent {
    pub fn new(mesh: MeshBuffers) -> Self {
        Self { mesh: Some(mesh) }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaterialComponent {
    pub material: Material,
}

impl MaterialComponent {
    pub fn new(material: Material) -> Self {
        Self { material }
    }
}
