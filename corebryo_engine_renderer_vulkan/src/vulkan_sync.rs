/// Frame synchronization - semaphores, the in-flight fence and per-image command buffers

use corebryo_engine::corebryo::{Error, Result};
use corebryo_engine::engine_error;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Primitives of the single frame in flight
pub struct FrameSync {
    ctx: Arc<GpuContext>,
    pub(crate) image_available: vk::Semaphore,
    pub(crate) render_finished: vk::Semaphore,
    /// Created signaled so the first frame does not block
    pub(crate) in_flight: vk::Fence,
}

impl FrameSync {
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let mut owned = Self {
            ctx,
            image_available: vk::Semaphore::null(),
            render_finished: vk::Semaphore::null(),
            in_flight: vk::Fence::null(),
        };

        let semaphore_info = vk::SemaphoreCreateInfo::default();
        let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);

        unsafe {
            owned.image_available = owned.ctx.device.create_semaphore(&semaphore_info, None)
                .map_err(|e| sync_error("image-available semaphore", e))?;
            owned.render_finished = owned.ctx.device.create_semaphore(&semaphore_info, None)
                .map_err(|e| sync_error("render-finished semaphore", e))?;
            owned.in_flight = owned.ctx.device.create_fence(&fence_info, None)
                .map_err(|e| sync_error("in-flight fence", e))?;
        }

        Ok(owned)
    }

    pub fn wait(&self) -> Result<()> {
        unsafe { self.ctx.device.wait_for_fences(&[self.in_flight], true, u64::MAX) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to wait for in-flight fence: {:?}", e);
                Error::BackendError(format!("Failed to wait for fence: {:?}", e))
            })
    }

    pub fn reset(&self) -> Result<()> {
        unsafe { self.ctx.device.reset_fences(&[self.in_flight]) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to reset in-flight fence: {:?}", e);
                Error::BackendError(format!("Failed to reset fence: {:?}", e))
            })
    }
}

impl Drop for FrameSync {
    fn drop(&mut self) {
        unsafe {
            if self.in_flight != vk::Fence::null() {
                self.ctx.device.destroy_fence(self.in_flight, None);
            }
            if self.render_finished != vk::Semaphore::null() {
                self.ctx.device.destroy_semaphore(self.render_finished, None);
            }
            if self.image_available != vk::Semaphore::null() {
                self.ctx.device.destroy_semaphore(self.image_available, None);
            }
        }
    }
}

fn sync_error(what: &str, e: vk::Result) -> Error {
    engine_error!("corebryo::vulkan", "Failed to create {}: {:?}", what, e);
    Error::InitializationFailed(format!("Failed to create {}: {:?}", what, e))
}

/// Command pool with one primary buffer per swapchain image
///
/// Reallocated with the swapchain; freeing the pool frees the buffers.
pub struct CommandBuffers {
    ctx: Arc<GpuContext>,
    pool: vk::CommandPool,
    buffers: Vec<vk::CommandBuffer>,
}

impl CommandBuffers {
    pub fn new(ctx: Arc<GpuContext>, count: u32) -> Result<Self> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { ctx.device.create_command_pool(&pool_info, None) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to create frame command pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
            })?;

        let mut owned = Self { ctx, pool, buffers: Vec::new() };

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        owned.buffers = unsafe { owned.ctx.device.allocate_command_buffers(&allocate_info) }
            .map_err(|e| {
                engine_error!("corebryo::vulkan", "Failed to allocate {} command buffers: {:?}", count, e);
                Error::InitializationFailed(format!("Failed to allocate command buffers: {:?}", e))
            })?;

        Ok(owned)
    }

    pub fn get(&self, image_index: u32) -> Result<vk::CommandBuffer> {
        self.buffers.get(image_index as usize).copied().ok_or_else(|| {
            engine_error!("corebryo::vulkan", "No command buffer for image {}", image_index);
            Error::InvalidResource(format!("No command buffer for image {}", image_index))
        })
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl Drop for CommandBuffers {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_command_pool(self.pool, None);
        }
    }
}
