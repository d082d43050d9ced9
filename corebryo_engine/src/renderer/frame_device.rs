/// FrameDevice trait - the backend operations a frame is built from
///
/// A backend owns the swapchain, attachments, pipelines, synchronization
/// primitives and per-image command buffers. `FrameRenderer` sequences these
/// operations; the backend only executes them.

use crate::error::Result;
use crate::renderer::{BufferHandle, CommandList, Extent2D, UniformBufferObject};

/// Outcome of acquiring a swapchain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    /// Image index ready for recording (suboptimal images are still usable)
    Image(u32),
    /// The surface changed; no image was acquired
    Stale,
}

/// Outcome of presenting a swapchain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Presented,
    /// Out of date, suboptimal or failed; the host should resize
    Stale,
}

/// Backend side of the frame loop
pub trait FrameDevice {
    /// Command recorder for one swapchain image
    type Commands<'a>: CommandList
    where
        Self: 'a;

    /// Current swapchain extent
    fn extent(&self) -> Extent2D;

    /// Number of swapchain images (and command buffers)
    fn image_count(&self) -> u32;

    /// Block until the in-flight fence is signaled
    fn wait_for_frame_fence(&mut self) -> Result<()>;

    /// Acquire the next image, signaling the image-acquired semaphore
    fn acquire_next_image(&mut self) -> Result<AcquireResult>;

    /// Return the in-flight fence to the unsignaled state
    fn reset_frame_fence(&mut self) -> Result<()>;

    /// Write the light uniform read by the world pipeline
    fn update_uniforms(&mut self, ubo: &UniformBufferObject) -> Result<()>;

    /// Recorder for the command buffer of `image_index`
    fn commands(&mut self, image_index: u32) -> Result<Self::Commands<'_>>;

    /// Whether a cubemap is resident and the sky pipeline can draw it
    fn skybox_ready(&self) -> bool;

    /// Vertex buffer holding `SKYBOX_VERTICES`
    fn skybox_vertex_buffer(&self) -> Option<BufferHandle>;

    /// Submit the recorded buffer: wait image-acquired, signal render-finished and the fence
    fn submit(&mut self, image_index: u32) -> Result<()>;

    /// Give up on an acquired image whose frame failed after the fence reset
    ///
    /// Consumes the image-acquired semaphore and leaves the in-flight fence
    /// signaled, so the next `wait_for_frame_fence` returns.
    fn abandon_frame(&mut self) -> Result<()>;

    /// Queue the image for presentation, waiting on render-finished
    fn present(&mut self, image_index: u32) -> PresentResult;

    /// Block until the device has no pending work
    fn wait_idle(&mut self) -> Result<()>;

    /// Rebuild everything sized by the swapchain
    ///
    /// Called with an idle device. Pipelines and the shadow target are kept.
    fn recreate_surface_resources(&mut self, extent: Extent2D) -> Result<()>;
}
