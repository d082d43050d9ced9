/// VulkanRenderer - Vulkan backend of the frame orchestrator
///
/// `VulkanFrameDevice` owns every GPU object a frame touches and executes the
/// `FrameDevice` operations; `VulkanRenderer` pairs it with the core
/// `FrameRenderer`, which decides what gets recorded.

use corebryo_engine::corebryo::{Error, Renderer, Result};
use corebryo_engine::corebryo::camera::Camera;
use corebryo_engine::corebryo::render::{
    AcquireResult, BufferHandle, DrawItem, Extent2D, FrameDevice, FrameOutcome, FrameRenderer,
    LightTransform, Overlay, PresentResult, RenderStats, RendererConfig, TextureHandle,
    UniformBufferObject, Vertex,
};
use corebryo_engine::corebryo::skybox::locate_assets_root;
use corebryo_engine::{engine_bail, engine_debug, engine_error, engine_info};
use ash::vk;
use std::path::PathBuf;
use std::sync::Arc;
use winit::window::Window;

use crate::vulkan_attachments::{sample_count_to_vk, AttachmentSet, ShadowTarget};
use crate::vulkan_buffer::{Buffer, GpuMesh};
use crate::vulkan_command_list::{FrameDescriptorSets, FrameTargets, VulkanCommandList};
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_set::DescriptorSetLayout;
use crate::vulkan_pipeline::PipelineSet;
use crate::vulkan_render_pass::{Framebuffer, RenderPass};
use crate::vulkan_skybox::SkyboxResources;
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_sync::{CommandBuffers, FrameSync};
use crate::vulkan_texture::TextureSet;

// ============================================================================
// Surface-sized resources
// ============================================================================

/// Everything rebuilt when the swapchain changes size
///
/// Fields drop in order: command buffers, framebuffers, attachments, swapchain.
struct SurfaceResources {
    command_buffers: CommandBuffers,
    framebuffers: Vec<Framebuffer>,
    attachments: AttachmentSet,
    swapchain: Swapchain,
}

impl SurfaceResources {
    /// Attachments, framebuffers and command buffers for a freshly built swapchain
    fn build(
        ctx: &Arc<GpuContext>,
        swapchain: Swapchain,
        main_pass: &RenderPass,
        msaa: vk::SampleCountFlags,
    ) -> Result<Self> {
        let image_count = swapchain.image_count();
        let attachments = AttachmentSet::new(
            ctx,
            swapchain.extent(),
            swapchain.format(),
            msaa,
            image_count as usize,
        )?;

        // Attachment order of the main pass: MSAA color, depth, resolve target
        let framebuffers = swapchain
            .image_views()
            .iter()
            .zip(&attachments.colors)
            .map(|(&swapchain_view, color)| {
                Framebuffer::new(
                    Arc::clone(ctx),
                    main_pass,
                    &[color.view, attachments.depth.view, swapchain_view],
                    swapchain.extent(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let command_buffers = CommandBuffers::new(Arc::clone(ctx), image_count)?;

        Ok(Self {
            command_buffers,
            framebuffers,
            attachments,
            swapchain,
        })
    }
}

// ============================================================================
// VulkanFrameDevice
// ============================================================================

/// GPU side of the frame loop
///
/// Fields drop in declaration order once `Drop::drop` has drained the device:
/// surface resources first, the shared context last.
pub struct VulkanFrameDevice {
    surface: Option<SurfaceResources>,
    textures: TextureSet,
    uniform_buffer: Buffer,
    world_layout: DescriptorSetLayout,
    pipelines: PipelineSet,
    main_pass: RenderPass,
    shadow: ShadowTarget,
    skybox: SkyboxResources,
    sync: FrameSync,
    msaa: vk::SampleCountFlags,
    vsync: bool,
    ctx: Arc<GpuContext>,
}

impl VulkanFrameDevice {
    /// Build the device, swapchain, attachments, pipelines and the default skybox
    pub fn new(window: &Window, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let ctx = Arc::new(GpuContext::new(window, config)?);

        let assets_root: PathBuf = match &config.assets_root {
            Some(root) => root.clone(),
            None => locate_assets_root()?,
        };
        engine_debug!("corebryo::vulkan", "Assets root: {}", assets_root.display());

        let msaa = sample_count_to_vk(config.msaa_samples);
        let swapchain = Swapchain::new(Arc::clone(&ctx), Extent2D::new(size.width, size.height), config.vsync, None)?;
        let main_pass = RenderPass::main(Arc::clone(&ctx), swapchain.format(), msaa)?;
        let surface = SurfaceResources::build(&ctx, swapchain, &main_pass, msaa)?;

        let shadow = ShadowTarget::new(&ctx)?;

        let uniform_buffer = Buffer::new(
            Arc::clone(&ctx),
            std::mem::size_of::<UniformBufferObject>() as u64,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            "light_ubo",
        )?;
        let initial_light = UniformBufferObject {
            light_view_proj: LightTransform::fixed().view_projection(),
        };
        uniform_buffer.write(0, bytemuck::bytes_of(&initial_light))?;

        let world_layout = DescriptorSetLayout::world(Arc::clone(&ctx))?;
        let textures = TextureSet::new(&ctx, &world_layout, &uniform_buffer, &shadow)?;

        let skybox = SkyboxResources::new(&ctx, &assets_root)?;

        let pipelines = PipelineSet::new(
            &ctx,
            &assets_root,
            &main_pass,
            &shadow.render_pass,
            &world_layout,
            skybox.layout(),
            msaa,
        )?;

        let sync = FrameSync::new(Arc::clone(&ctx))?;

        let extent = surface.swapchain.extent();
        engine_info!(
            "corebryo::vulkan",
            "Vulkan renderer ready: {}x{}, {} images, {:?}",
            extent.width,
            extent.height,
            surface.swapchain.image_count(),
            msaa
        );

        Ok(Self {
            surface: Some(surface),
            textures,
            uniform_buffer,
            world_layout,
            pipelines,
            main_pass,
            shadow,
            skybox,
            sync,
            msaa,
            vsync: config.vsync,
            ctx,
        })
    }

    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    pub fn skybox(&self) -> &SkyboxResources {
        &self.skybox
    }

    pub fn skybox_mut(&mut self) -> &mut SkyboxResources {
        &mut self.skybox
    }

    /// Upload tightly packed RGBA8 texels as a material texture
    pub fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureHandle> {
        let name = format!("texture_{}", self.textures.sets().len());
        self.textures.push(&self.world_layout, &self.uniform_buffer, &self.shadow, width, height, rgba, &name)
    }

    fn surface(&self) -> Result<&SurfaceResources> {
        self.surface.as_ref().ok_or_else(|| {
            engine_error!("corebryo::vulkan", "Surface resources are not built");
            Error::BackendError("Surface resources are not built".to_string())
        })
    }
}

impl FrameDevice for VulkanFrameDevice {
    type Commands<'a> = VulkanCommandList<'a>;

    fn extent(&self) -> Extent2D {
        self.surface
            .as_ref()
            .map_or(Extent2D::default(), |surface| surface.swapchain.extent())
    }

    fn image_count(&self) -> u32 {
        self.surface
            .as_ref()
            .map_or(0, |surface| surface.swapchain.image_count())
    }

    fn wait_for_frame_fence(&mut self) -> Result<()> {
        self.sync.wait()
    }

    fn acquire_next_image(&mut self) -> Result<AcquireResult> {
        self.surface()?.swapchain.acquire(self.sync.image_available)
    }

    fn reset_frame_fence(&mut self) -> Result<()> {
        self.sync.reset()
    }

    fn update_uniforms(&mut self, ubo: &UniformBufferObject) -> Result<()> {
        self.uniform_buffer.write(0, bytemuck::bytes_of(ubo))
    }

    fn commands(&mut self, image_index: u32) -> Result<Self::Commands<'_>> {
        let surface = self.surface()?;
        let command_buffer = surface.command_buffers.get(image_index)?;
        let framebuffer = surface.framebuffers.get(image_index as usize).ok_or_else(|| {
            Error::InvalidResource(format!("No framebuffer for image {}", image_index))
        })?;

        Ok(VulkanCommandList::new(
            &self.ctx.device,
            self.ctx.debug_utils.as_ref(),
            command_buffer,
            &self.pipelines,
            FrameDescriptorSets {
                world: self.textures.sets(),
                skybox: self.skybox.descriptor_set(),
            },
            FrameTargets {
                main_pass: self.main_pass.render_pass,
                main_framebuffer: framebuffer.framebuffer,
                shadow_pass: self.shadow.render_pass.render_pass,
                shadow_framebuffer: self.shadow.framebuffer.framebuffer,
                shadow_image: self.shadow.image.image,
            },
        ))
    }

    fn skybox_ready(&self) -> bool {
        self.skybox.is_ready()
    }

    fn skybox_vertex_buffer(&self) -> Option<BufferHandle> {
        Some(self.skybox.vertex_buffer())
    }

    fn submit(&mut self, image_index: u32) -> Result<()> {
        let command_buffer = self.surface()?.command_buffers.get(image_index)?;

        let wait_semaphores = [self.sync.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [self.sync.render_finished];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.ctx.device.queue_submit(self.ctx.graphics_queue, &[submit_info], self.sync.in_flight)
        }
        .map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to submit frame {}: {:?}", image_index, e);
            Error::BackendError(format!("Failed to submit command buffer: {:?}", e))
        })
    }

    fn abandon_frame(&mut self) -> Result<()> {
        // Empty batch: unsignals image-available and signals the fence
        let wait_semaphores = [self.sync.image_available];
        let wait_stages = [vk::PipelineStageFlags::ALL_COMMANDS];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages);

        unsafe {
            self.ctx.device.queue_submit(self.ctx.graphics_queue, &[submit_info], self.sync.in_flight)
        }
        .map_err(|e| {
            engine_error!("corebryo::vulkan", "Failed to abandon frame: {:?}", e);
            Error::BackendError(format!("Failed to submit empty batch: {:?}", e))
        })
    }

    fn present(&mut self, image_index: u32) -> PresentResult {
        match self.surface.as_ref() {
            Some(surface) => surface.swapchain.present(self.sync.render_finished, image_index),
            None => PresentResult::Stale,
        }
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.ctx.wait_idle()
    }

    fn recreate_surface_resources(&mut self, extent: Extent2D) -> Result<()> {
        let old_swapchain = self.surface.take().map(|surface| {
            // Everything but the swapchain goes before the new one exists
            let SurfaceResources { swapchain, .. } = surface;
            swapchain
        });
        let old_format = old_swapchain.as_ref().map(Swapchain::format);

        let swapchain = Swapchain::new(Arc::clone(&self.ctx), extent, self.vsync, old_swapchain.as_ref())?;
        drop(old_swapchain);

        // Pipelines and the main pass are kept, so the format must not change
        if old_format.is_some_and(|format| format != swapchain.format()) {
            engine_bail!(
                "corebryo::vulkan",
                "Surface format changed from {:?} to {:?}",
                old_format,
                swapchain.format()
            );
        }

        self.surface = Some(SurfaceResources::build(&self.ctx, swapchain, &self.main_pass, self.msaa)?);
        Ok(())
    }
}

impl Drop for VulkanFrameDevice {
    fn drop(&mut self) {
        self.ctx.wait_idle().ok();
    }
}

// ============================================================================
// VulkanRenderer
// ============================================================================

/// Vulkan renderer: the core frame orchestrator over a `VulkanFrameDevice`
pub struct VulkanRenderer {
    frame: FrameRenderer<VulkanFrameDevice>,
}

impl VulkanRenderer {
    /// Create a new Vulkan renderer
    ///
    /// # Arguments
    ///
    /// * `window` - Window to render to
    /// * `config` - Renderer configuration
    ///
    /// # Returns
    ///
    /// A renderer ready to draw, with the catalog's default skybox resident.
    pub fn new(window: &Window, config: RendererConfig) -> Result<Self> {
        let device = VulkanFrameDevice::new(window, &config)?;
        Ok(Self {
            frame: FrameRenderer::new(device),
        })
    }

    /// Upload a mesh; its `buffers()` feed `DrawItem`s
    ///
    /// Call `wait_idle` before dropping a mesh that recent frames referenced.
    pub fn create_mesh(&self, vertices: &[Vertex], indices: Option<&[u32]>) -> Result<GpuMesh> {
        GpuMesh::new(Arc::clone(self.frame.device().context()), vertices, indices)
    }

    /// Upload an RGBA8 texture for `Material::texture`
    ///
    /// Textures live as long as the renderer.
    pub fn create_texture(&mut self, width: u32, height: u32, rgba: &[u8]) -> Result<TextureHandle> {
        self.frame.device_mut().create_texture(width, height, rgba)
    }

    /// Replace the resident cubemap with catalog entry `name`
    pub fn set_active_skybox(&mut self, name: &str) -> Result<()> {
        self.frame.device_mut().skybox_mut().set_active_skybox(name)
    }

    pub fn active_skybox_name(&self) -> Option<&str> {
        self.frame.device().skybox().active_skybox_name()
    }

    pub fn is_skybox_ready(&self) -> bool {
        self.frame.device().skybox().is_ready()
    }

    /// Names of every catalog entry, sorted
    pub fn skybox_names(&self) -> Vec<String> {
        self.frame
            .device()
            .skybox()
            .catalog()
            .entries()
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub fn frame_renderer(&self) -> &FrameRenderer<VulkanFrameDevice> {
        &self.frame
    }

    pub fn frame_renderer_mut(&mut self) -> &mut FrameRenderer<VulkanFrameDevice> {
        &mut self.frame
    }
}

impl Renderer for VulkanRenderer {
    fn set_render_items(&mut self, items: Vec<DrawItem>) {
        self.frame.set_render_items(items);
    }

    fn draw_frame(&mut self, delta_time: f32) -> Result<FrameOutcome> {
        self.frame.draw_frame(delta_time)
    }

    fn on_resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.frame.on_resize(width, height)
    }

    fn stats(&self) -> RenderStats {
        self.frame.stats()
    }

    fn camera(&self) -> &Camera {
        self.frame.camera()
    }

    fn camera_mut(&mut self) -> &mut Camera {
        self.frame.camera_mut()
    }

    fn set_overlay(&mut self, overlay: Option<Box<dyn Overlay>>) {
        self.frame.set_overlay(overlay);
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.frame.wait_idle()
    }
}
