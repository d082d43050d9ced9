/*!
# Corebryo Engine - Vulkan Renderer Backend

Vulkan implementation of the Corebryo frame orchestrator.

The core crate decides what a frame records; this crate owns the GPU side:
instance and device bootstrap, the swapchain, the MSAA color/depth and shadow
attachments, the sky/world/shadow pipelines, the light uniform buffer, material
textures and the skybox cubemaps. Bindings come from Ash, memory from gpu-allocator.

```no_run
use corebryo_engine::corebryo::render::RendererConfig;
use corebryo_engine_renderer_vulkan::VulkanRenderer;
# fn demo(window: &winit::window::Window) -> corebryo_engine::corebryo::Result<()> {
let renderer = VulkanRenderer::new(window, RendererConfig::default())?;
# Ok(())
# }
```
*/

mod vulkan_context;
mod vulkan_buffer;
mod vulkan_attachments;
mod vulkan_render_pass;
mod vulkan_swapchain;
mod vulkan_descriptor_set;
mod vulkan_pipeline;
mod vulkan_sync;
mod vulkan_command_list;
mod vulkan_skybox;
mod vulkan_texture;
mod vulkan_renderer;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan_renderer::{VulkanFrameDevice, VulkanRenderer};
pub use vulkan_buffer::GpuMesh;
pub use vulkan_context::GpuContext;
pub use vulkan_attachments::DEPTH_FORMAT;
pub use vulkan_skybox::CUBEMAP_FORMAT;
pub use vulkan_texture::TEXTURE_FORMAT;

