/// GPU-visible parameter blocks (push constants and the light uniform)
///
/// Layouts match the std430/std140 declarations in the compiled shaders.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use crate::renderer::Material;

/// Render mode flag read by the world fragment shader: lit + shadowed
pub const RENDER_MODE_LIT: i32 = 1;

/// Per-draw constants of the world pipeline (vertex + fragment, 160 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MainPushConstants {
    pub mvp: Mat4,
    pub model: Mat4,
    pub base_color: [f32; 3],
    pub ambient: f32,
    pub alpha: f32,
    pub mode: i32,
    pub _pad: [f32; 2],
}

impl MainPushConstants {
    pub fn new(mvp: Mat4, model: Mat4, material: &Material, mode: i32) -> Self {
        Self {
            mvp,
            model,
            base_color: material.base_color.to_array(),
            ambient: material.ambient,
            alpha: material.alpha,
            mode,
            _pad: [0.0; 2],
        }
    }
}

/// Per-draw constants of the shadow pipeline (vertex only, 128 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowPushConstants {
    pub light_view_proj: Mat4,
    pub model: Mat4,
}

/// Constants of the sky pipeline (vertex only, 128 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkyboxPushConstants {
    /// Projection times rotation-only view
    pub view_proj: Mat4,
    /// Rotation applied to cubemap lookup directions
    pub view_inverse: Mat4,
}

/// Uniform buffer at set 0, binding 0 of the world layout
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct UniformBufferObject {
    pub light_view_proj: Mat4,
}

pub const MAIN_PUSH_CONSTANTS_SIZE: u32 = std::mem::size_of::<MainPushConstants>() as u32;
pub const SHADOW_PUSH_CONSTANTS_SIZE: u32 = std::mem::size_of::<ShadowPushConstants>() as u32;
pub const SKYBOX_PUSH_CONSTANTS_SIZE: u32 = std::mem::size_of::<SkyboxPushConstants>() as u32;
