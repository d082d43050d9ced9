/// CommandList - Vulkan recording of one frame into a swapchain image's command buffer

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::corebryo::render::{
    BarrierAccess, BarrierStage, BufferHandle, ClearValue, CommandList, DepthBarrier, ImageLayout,
    IndexType, PipelineKind, Rect2D, RenderPassKind, ShaderStages, TextureHandle, Viewport,
};
use corebryo_engine::{engine_error, engine_warn};
use ash::vk;
use std::ffi::CString;

use crate::vulkan_buffer::vk_buffer;
use crate::vulkan_pipeline::PipelineSet;
use crate::vulkan_texture::world_set_for;

/// Render passes and framebuffers a frame can begin
#[derive(Debug, Clone, Copy)]
pub struct FrameTargets {
    pub main_pass: vk::RenderPass,
    /// Framebuffer of the image being recorded
    pub main_framebuffer: vk::Framebuffer,
    pub shadow_pass: vk::RenderPass,
    pub shadow_framebuffer: vk::Framebuffer,
    /// Image transitioned by `shadow_barrier`
    pub shadow_image: vk::Image,
}

/// Descriptor sets bound by kind
#[derive(Debug, Clone, Copy)]
pub struct FrameDescriptorSets<'a> {
    /// One world set per texture, the default texture first
    pub world: &'a [vk::DescriptorSet],
    /// Absent until a cubemap is uploaded
    pub skybox: Option<vk::DescriptorSet>,
}

/// Vulkan command list
///
/// Borrows everything it records against; lives for one frame.
pub struct VulkanCommandList<'a> {
    device: &'a ash::Device,
    debug_utils: Option<&'a ash::ext::debug_utils::Device>,
    command_buffer: vk::CommandBuffer,
    pipelines: &'a PipelineSet,
    descriptor_sets: FrameDescriptorSets<'a>,
    targets: FrameTargets,
    /// Whether the command list is currently recording
    is_recording: bool,
    /// Whether we're inside a render pass
    in_render_pass: bool,
    /// Currently bound pipeline (for push constants and descriptor sets)
    bound_pipeline: Option<PipelineKind>,
    open_labels: u32,
}

impl<'a> VulkanCommandList<'a> {
    pub fn new(
        device: &'a ash::Device,
        debug_utils: Option<&'a ash::ext::debug_utils::Device>,
        command_buffer: vk::CommandBuffer,
        pipelines: &'a PipelineSet,
        descriptor_sets: FrameDescriptorSets<'a>,
        targets: FrameTargets,
    ) -> Self {
        Self {
            device,
            debug_utils,
            command_buffer,
            pipelines,
            descriptor_sets,
            targets,
            is_recording: false,
            in_render_pass: false,
            bound_pipeline: None,
            open_labels: 0,
        }
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        Ok(())
    }

    fn bound_layout(&self) -> Result<vk::PipelineLayout> {
        self.bound_pipeline
            .map(|kind| self.pipelines.get(kind).layout)
            .ok_or_else(|| Error::BackendError("No pipeline bound".to_string()))
    }
}

impl CommandList for VulkanCommandList<'_> {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::BackendError("Command list already recording".to_string()));
        }

        unsafe {
            self.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to reset command buffer: {:?}", e);
                    Error::BackendError(format!("Failed to reset command buffer: {:?}", e))
                })?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to begin command buffer: {:?}", e);
                    Error::BackendError(format!("Failed to begin command buffer: {:?}", e))
                })?;
        }

        self.is_recording = true;
        self.in_render_pass = false;
        self.bound_pipeline = None;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;

        if self.in_render_pass {
            return Err(Error::BackendError("Render pass not ended before ending command list".to_string()));
        }

        unsafe {
            self.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| {
                    engine_error!("corebryo::vulkan", "Failed to end command buffer: {:?}", e);
                    Error::BackendError(format!("Failed to end command buffer: {:?}", e))
                })?;
        }

        self.is_recording = false;
        Ok(())
    }

    fn shadow_barrier(&mut self, barrier: &DepthBarrier) -> Result<()> {
        self.ensure_recording()?;

        if self.in_render_pass {
            return Err(Error::BackendError("Image barrier inside a render pass".to_string()));
        }

        let image_barrier = vk::ImageMemoryBarrier::default()
            .src_access_mask(access_to_vk(barrier.src_access))
            .dst_access_mask(access_to_vk(barrier.dst_access))
            .old_layout(layout_to_vk(barrier.old_layout))
            .new_layout(layout_to_vk(barrier.new_layout))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.targets.shadow_image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::DEPTH,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe {
            self.device.cmd_pipeline_barrier(
                self.command_buffer,
                stage_to_vk(barrier.src_stage),
                stage_to_vk(barrier.dst_stage),
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[image_barrier],
            );
        }
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        pass: RenderPassKind,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.ensure_recording()?;

        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }

        let (render_pass, framebuffer) = match pass {
            RenderPassKind::Shadow => (self.targets.shadow_pass, self.targets.shadow_framebuffer),
            RenderPassKind::Main => (self.targets.main_pass, self.targets.main_framebuffer),
        };

        let vk_clear_values: Vec<vk::ClearValue> = clear_values.iter().map(clear_value_to_vk).collect();

        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(rect_to_vk(render_area))
            .clear_values(&vk_clear_values);

        unsafe {
            self.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
        }

        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_recording()?;

        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }

        unsafe {
            self.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_recording()?;

        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);

        unsafe {
            self.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.ensure_recording()?;

        unsafe {
            self.device.cmd_set_scissor(self.command_buffer, 0, &[rect_to_vk(scissor)]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: PipelineKind) -> Result<()> {
        self.ensure_recording()?;

        unsafe {
            self.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipelines.get(pipeline).pipeline,
            );
        }
        self.bound_pipeline = Some(pipeline);
        Ok(())
    }

    fn bind_descriptor_set(&mut self, pipeline: PipelineKind) -> Result<()> {
        self.ensure_recording()?;

        let set = match pipeline {
            PipelineKind::World => world_set_for(self.descriptor_sets.world, None)?,
            PipelineKind::Sky => self.descriptor_sets.skybox.ok_or_else(|| {
                Error::BackendError("Skybox descriptor set not ready".to_string())
            })?,
            PipelineKind::Shadow => {
                return Err(Error::BackendError("Shadow pipeline has no descriptor set".to_string()));
            }
        };

        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipelines.get(pipeline).layout,
                0,
                &[set],
                &[],
            );
        }
        Ok(())
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) -> Result<()> {
        self.ensure_recording()?;
        if self.bound_pipeline != Some(PipelineKind::World) {
            return Err(Error::BackendError("Textures bind with the world pipeline only".to_string()));
        }
        let set = world_set_for(self.descriptor_sets.world, texture)?;

        unsafe {
            self.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipelines.get(PipelineKind::World).layout,
                0,
                &[set],
                &[],
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, stages: ShaderStages, offset: u32, data: &[u8]) -> Result<()> {
        self.ensure_recording()?;
        let layout = self.bound_layout()?;

        unsafe {
            self.device.cmd_push_constants(
                self.command_buffer,
                layout,
                shader_stages_to_vk(stages),
                offset,
                data,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()> {
        self.ensure_recording()?;

        unsafe {
            self.device.cmd_bind_vertex_buffers(
                self.command_buffer,
                0,
                &[vk_buffer(buffer)],
                &[offset],
            );
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64, index_type: IndexType) -> Result<()> {
        self.ensure_recording()?;

        unsafe {
            self.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer(buffer),
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.ensure_recording()?;

        unsafe {
            self.device.cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.ensure_recording()?;

        unsafe {
            self.device.cmd_draw_indexed(self.command_buffer, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }

    fn begin_label(&mut self, label: &str) -> Result<()> {
        self.ensure_recording()?;

        let Some(debug_utils) = self.debug_utils else {
            return Ok(());
        };

        let name = label_name(label);
        let label_info = vk::DebugUtilsLabelEXT::default().label_name(&name);

        unsafe {
            debug_utils.cmd_begin_debug_utils_label(self.command_buffer, &label_info);
        }
        self.open_labels += 1;
        Ok(())
    }

    fn end_label(&mut self) -> Result<()> {
        self.ensure_recording()?;

        let Some(debug_utils) = self.debug_utils else {
            return Ok(());
        };

        if self.open_labels == 0 {
            return Err(Error::BackendError("No debug label open".to_string()));
        }

        unsafe {
            debug_utils.cmd_end_debug_utils_label(self.command_buffer);
        }
        self.open_labels -= 1;
        Ok(())
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::DepthAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
    }
}

fn access_to_vk(access: BarrierAccess) -> vk::AccessFlags {
    match access {
        BarrierAccess::None => vk::AccessFlags::empty(),
        BarrierAccess::DepthAttachmentWrite => vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        BarrierAccess::ShaderRead => vk::AccessFlags::SHADER_READ,
    }
}

fn stage_to_vk(stage: BarrierStage) -> vk::PipelineStageFlags {
    match stage {
        BarrierStage::TopOfPipe => vk::PipelineStageFlags::TOP_OF_PIPE,
        BarrierStage::EarlyFragmentTests => vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        BarrierStage::LateFragmentTests => vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
        BarrierStage::FragmentShader => vk::PipelineStageFlags::FRAGMENT_SHADER,
    }
}

fn shader_stages_to_vk(stages: ShaderStages) -> vk::ShaderStageFlags {
    let mut flags = vk::ShaderStageFlags::empty();
    if stages.contains(ShaderStages::VERTEX) {
        flags |= vk::ShaderStageFlags::VERTEX;
    }
    if stages.contains(ShaderStages::FRAGMENT) {
        flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    flags
}

fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match *value {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue { float32: color },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        },
    }
}

fn rect_to_vk(rect: Rect2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: rect.x, y: rect.y },
        extent: vk::Extent2D { width: rect.width, height: rect.height },
    }
}

/// Debug label text, cut at the first interior NUL
fn label_name(label: &str) -> CString {
    match CString::new(label) {
        Ok(name) => name,
        Err(e) => {
            engine_warn!("corebryo::vulkan", "Debug label {:?} contains a NUL byte, truncating", label);
            let nul = e.nul_position();
            let mut bytes = e.into_vec();
            bytes.truncate(nul);
            CString::new(bytes).unwrap_or_default()
        }
    }
}

#[cfg(test)]
#[path = "vulkan_command_list_tests.rs"]
mod tests;
