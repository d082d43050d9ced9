/// Overlay hook - lets an editor GUI draw into the frame after the core passes

use crate::error::Result;
use crate::renderer::CommandList;

/// Per-frame counters published to the overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Draw calls recorded in the frame (shadow, skybox and opaque)
    pub draw_calls: u32,
    /// Triangles submitted by the opaque stage
    pub triangles: u32,
    /// Vertices submitted by the opaque stage
    pub vertices: u32,
}

/// External renderer invoked inside the main pass, after the transparent stage
///
/// Stats and timing describe the previous frame; `record` is called while the
/// main render pass of the current frame is still open.
pub trait Overlay: Send {
    fn set_render_stats(&mut self, stats: RenderStats);

    fn set_frame_time(&mut self, delta_time: f32);

    fn record(&mut self, commands: &mut dyn CommandList) -> Result<()>;
}
