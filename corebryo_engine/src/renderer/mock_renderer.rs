/// Mock backend for unit tests (no GPU required)
///
/// `MockFrameDevice` plays the part of the Vulkan device: it records every
/// command as a string, simulates the in-flight fence, follows scripted
/// acquire/present results and keeps a ledger of created and destroyed
/// resources that outlives the device.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use crate::engine_bail;
use crate::error::Result;
use crate::renderer::{
    AcquireResult, BufferHandle, ClearValue, CommandList, DepthBarrier, Extent2D, FrameDevice,
    IndexType, PipelineKind, PresentResult, Rect2D, RenderPassKind, ShaderStages, TextureHandle,
    UniformBufferObject, Viewport,
};

// ============================================================================
// Mock CommandList
// ============================================================================

#[derive(Debug, Default)]
pub struct MockCommandList {
    pub commands: Vec<String>,
    pub barriers: Vec<DepthBarrier>,
    /// Raw bytes of every push, in order
    pub pushes: Vec<Vec<u8>>,
    /// Recording a command starting with this prefix fails
    pub fail_on: Option<String>,
}

impl MockCommandList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw commands recorded while `label` was the innermost open label
    pub fn draws_in_stage(&self, label: &str) -> Vec<String> {
        let mut stack: Vec<&str> = Vec::new();
        let mut draws = Vec::new();

        for command in &self.commands {
            if let Some(opened) = command.strip_prefix("begin_label ") {
                stack.push(opened);
            } else if command == "end_label" {
                stack.pop();
            } else if command.starts_with("draw") && stack.last() == Some(&label) {
                draws.push(command.clone());
            }
        }
        draws
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn position(&self, command: &str) -> Option<usize> {
        self.commands.iter().position(|c| c == command)
    }

    fn record(&mut self, command: String) -> Result<()> {
        if let Some(prefix) = &self.fail_on {
            if command.starts_with(prefix.as_str()) {
                engine_bail!("corebryo::mock", "Recording '{}' failed", command);
            }
        }
        self.commands.push(command);
        Ok(())
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        // Beginning resets the buffer, like vkResetCommandBuffer + vkBeginCommandBuffer
        self.commands.clear();
        self.barriers.clear();
        self.pushes.clear();
        self.record("begin".to_string())
    }

    fn end(&mut self) -> Result<()> {
        self.record("end".to_string())
    }

    fn shadow_barrier(&mut self, barrier: &DepthBarrier) -> Result<()> {
        self.record(format!(
            "shadow_barrier {:?}->{:?}",
            barrier.old_layout, barrier.new_layout
        ))?;
        self.barriers.push(*barrier);
        Ok(())
    }

    fn begin_render_pass(&mut self, pass: RenderPassKind, render_area: Rect2D, clear_values: &[ClearValue]) -> Result<()> {
        self.record(format!(
            "begin_render_pass {:?} {}x{} clears={}",
            pass,
            render_area.width,
            render_area.height,
            clear_values.len()
        ))
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.record("end_render_pass".to_string())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!("set_viewport {}x{}", viewport.width, viewport.height))
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.record(format!("set_scissor {}x{}", scissor.width, scissor.height))
    }

    fn bind_pipeline(&mut self, pipeline: PipelineKind) -> Result<()> {
        self.record(format!("bind_pipeline {:?}", pipeline))
    }

    fn bind_descriptor_set(&mut self, pipeline: PipelineKind) -> Result<()> {
        self.record(format!("bind_descriptor_set {:?}", pipeline))
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) -> Result<()> {
        match texture {
            Some(texture) => self.record(format!("bind_texture {}", texture.0)),
            None => self.record("bind_texture default".to_string()),
        }
    }

    fn push_constants(&mut self, stages: ShaderStages, offset: u32, data: &[u8]) -> Result<()> {
        self.record(format!("push_constants {:?} {} {}", stages, offset, data.len()))?;
        self.pushes.push(data.to_vec());
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()> {
        self.record(format!("bind_vertex_buffer {} {}", buffer.0, offset))
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64, index_type: IndexType) -> Result<()> {
        self.record(format!("bind_index_buffer {} {} {:?}", buffer.0, offset, index_type))
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.record(format!("draw {} {}", vertex_count, first_vertex))
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.record(format!("draw_indexed {} {} {}", index_count, first_index, vertex_offset))
    }

    fn begin_label(&mut self, label: &str) -> Result<()> {
        self.record(format!("begin_label {}", label))
    }

    fn end_label(&mut self) -> Result<()> {
        self.record("end_label".to_string())
    }
}

// ============================================================================
// Resource ledger
// ============================================================================

/// Names of created and destroyed mock resources
#[derive(Debug, Default)]
pub struct ResourceLedger {
    pub created: Vec<String>,
    pub destroyed: Vec<String>,
}

impl ResourceLedger {
    /// Resources created but not destroyed yet
    pub fn live(&self) -> Vec<String> {
        let mut live = self.created.clone();
        for name in &self.destroyed {
            if let Some(i) = live.iter().position(|c| c == name) {
                live.swap_remove(i);
            }
        }
        live
    }
}

// ============================================================================
// Mock FrameDevice
// ============================================================================

pub const MOCK_SKYBOX_BUFFER: BufferHandle = BufferHandle(0x5C1);

pub struct MockFrameDevice {
    pub extent: Extent2D,
    pub image_count: u32,
    pub next_image: u32,

    pub fence_signaled: bool,
    pub fence_waits: u32,
    pub fence_resets: u32,

    /// Consumed front to back; empty means "next image"
    pub acquire_script: VecDeque<AcquireResult>,
    /// Consumed front to back; empty means `Presented`
    pub present_script: VecDeque<PresentResult>,

    pub skybox_ready: bool,
    pub fail_submit: bool,
    /// `commands()` fails instead of handing out a recorder
    pub fail_commands: bool,
    /// Recording a command with this prefix fails, see `MockCommandList::fail_on`
    pub fail_recording_on: Option<String>,
    pub abandoned: u32,

    pub command_lists: Vec<MockCommandList>,
    pub last_recorded: Option<u32>,
    pub uniform_uploads: Vec<UniformBufferObject>,
    pub submitted: Vec<u32>,
    pub presented: Vec<u32>,
    pub wait_idle_calls: u32,
    pub recreated: Vec<Extent2D>,

    pub ledger: Arc<Mutex<ResourceLedger>>,
}

impl MockFrameDevice {
    pub fn new(width: u32, height: u32) -> Self {
        let mut device = Self {
            extent: Extent2D::new(width, height),
            image_count: 3,
            next_image: 0,
            fence_signaled: true,
            fence_waits: 0,
            fence_resets: 0,
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            skybox_ready: false,
            fail_submit: false,
            fail_commands: false,
            fail_recording_on: None,
            abandoned: 0,
            command_lists: Vec::new(),
            last_recorded: None,
            uniform_uploads: Vec::new(),
            submitted: Vec::new(),
            presented: Vec::new(),
            wait_idle_calls: 0,
            recreated: Vec::new(),
            ledger: Arc::new(Mutex::new(ResourceLedger::default())),
        };

        device.create("pipeline_set");
        device.create("shadow_target");
        device.create("frame_sync");
        device.create_surface_resources();
        device
    }

    pub fn with_skybox(mut self) -> Self {
        self.skybox_ready = true;
        self
    }

    /// Commands of the most recently recorded image
    pub fn last_commands(&self) -> &MockCommandList {
        let index = self.last_recorded.unwrap_or(0) as usize;
        &self.command_lists[index]
    }

    fn create(&mut self, name: &str) {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.created.push(name.to_string());
        }
    }

    fn destroy(&mut self, name: &str) {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.destroyed.push(name.to_string());
        }
    }

    fn create_surface_resources(&mut self) {
        self.create("swapchain");
        self.create("attachments");
        self.create("framebuffers");
        self.create("command_buffers");
        self.command_lists = (0..self.image_count).map(|_| MockCommandList::new()).collect();
    }

    fn destroy_surface_resources(&mut self) {
        self.destroy("command_buffers");
        self.destroy("framebuffers");
        self.destroy("attachments");
        self.destroy("swapchain");
        self.command_lists.clear();
    }
}

impl FrameDevice for MockFrameDevice {
    type Commands<'a> = &'a mut MockCommandList;

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn image_count(&self) -> u32 {
        self.image_count
    }

    fn wait_for_frame_fence(&mut self) -> Result<()> {
        self.fence_waits += 1;
        if !self.fence_signaled {
            // A real wait would never return
            engine_bail!("corebryo::mock", "Waiting on an unsignaled fence with nothing in flight");
        }
        Ok(())
    }

    fn acquire_next_image(&mut self) -> Result<AcquireResult> {
        if let Some(result) = self.acquire_script.pop_front() {
            return Ok(result);
        }
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        Ok(AcquireResult::Image(index))
    }

    fn reset_frame_fence(&mut self) -> Result<()> {
        self.fence_resets += 1;
        self.fence_signaled = false;
        Ok(())
    }

    fn update_uniforms(&mut self, ubo: &UniformBufferObject) -> Result<()> {
        self.uniform_uploads.push(*ubo);
        Ok(())
    }

    fn commands(&mut self, image_index: u32) -> Result<Self::Commands<'_>> {
        if self.fail_commands {
            engine_bail!("corebryo::mock", "vkResetCommandBuffer failed");
        }
        self.last_recorded = Some(image_index);
        match self.command_lists.get_mut(image_index as usize) {
            Some(list) => {
                list.fail_on = self.fail_recording_on.clone();
                Ok(list)
            }
            None => engine_bail!("corebryo::mock", "No command buffer for image {}", image_index),
        }
    }

    fn skybox_ready(&self) -> bool {
        self.skybox_ready
    }

    fn skybox_vertex_buffer(&self) -> Option<BufferHandle> {
        Some(MOCK_SKYBOX_BUFFER)
    }

    fn submit(&mut self, image_index: u32) -> Result<()> {
        if self.fail_submit {
            engine_bail!("corebryo::mock", "vkQueueSubmit failed");
        }
        self.submitted.push(image_index);
        // The GPU finishes instantly
        self.fence_signaled = true;
        Ok(())
    }

    fn abandon_frame(&mut self) -> Result<()> {
        self.abandoned += 1;
        self.fence_signaled = true;
        Ok(())
    }

    fn present(&mut self, image_index: u32) -> PresentResult {
        self.presented.push(image_index);
        self.present_script.pop_front().unwrap_or(PresentResult::Presented)
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.wait_idle_calls += 1;
        Ok(())
    }

    fn recreate_surface_resources(&mut self, extent: Extent2D) -> Result<()> {
        self.destroy_surface_resources();
        self.extent = extent;
        self.create_surface_resources();
        self.recreated.push(extent);
        Ok(())
    }
}

impl Drop for MockFrameDevice {
    fn drop(&mut self) {
        self.destroy_surface_resources();
        self.destroy("frame_sync");
        self.destroy("shadow_target");
        self.destroy("pipeline_set");
    }
}

#[cfg(test)]
#[path = "mock_renderer_tests.rs"]
mod tests;
