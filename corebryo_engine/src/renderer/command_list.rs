/// CommandList trait - records one frame's GPU commands
///
/// The frame orchestrator drives a backend command list through this trait.
/// Render passes, pipelines and descriptor sets are owned by the backend and
/// addressed here by kind, so the recording order can be checked without a GPU.

use bitflags::bitflags;
use crate::error::Result;
use crate::renderer::{BufferHandle, TextureHandle};

/// Command list for recording rendering commands
///
/// Commands are recorded into the command buffer of the acquired swapchain image
/// and submitted by `FrameDevice::submit`.
pub trait CommandList {
    /// Reset the underlying buffer and begin recording
    fn begin(&mut self) -> Result<()>;

    /// End recording
    fn end(&mut self) -> Result<()>;

    /// Insert a layout transition for the shadow depth image
    fn shadow_barrier(&mut self, barrier: &DepthBarrier) -> Result<()>;

    /// Begin a render pass on the framebuffer matching `pass`
    ///
    /// The main pass targets the framebuffer of the image being recorded.
    fn begin_render_pass(
        &mut self,
        pass: RenderPassKind,
        render_area: Rect2D,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Bind one of the graphics pipelines of the pipeline set
    fn bind_pipeline(&mut self, pipeline: PipelineKind) -> Result<()>;

    /// Bind the descriptor set that belongs to `pipeline`'s layout at set 0
    fn bind_descriptor_set(&mut self, pipeline: PipelineKind) -> Result<()>;

    /// Rebind the world set at set 0 with `texture` as the diffuse texture
    ///
    /// `None` selects the default white texture. Requires the world pipeline.
    fn bind_texture(&mut self, texture: Option<TextureHandle>) -> Result<()>;

    /// Push constants into the currently bound pipeline's layout
    ///
    /// # Arguments
    ///
    /// * `stages` - Shader stages that read the range
    /// * `offset` - Offset in bytes into the push constant range
    /// * `data` - Raw bytes (usually `bytemuck::bytes_of` of a push struct)
    fn push_constants(&mut self, stages: ShaderStages, offset: u32, data: &[u8]) -> Result<()>;

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()>;

    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64, index_type: IndexType) -> Result<()>;

    /// Non-indexed draw of a single instance
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Indexed draw of a single instance
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Open a named debug region (shows up in frame captures)
    fn begin_label(&mut self, _label: &str) -> Result<()> {
        Ok(())
    }

    /// Close the innermost debug region
    fn end_label(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: CommandList + ?Sized> CommandList for &mut T {
    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }

    fn shadow_barrier(&mut self, barrier: &DepthBarrier) -> Result<()> {
        (**self).shadow_barrier(barrier)
    }

    fn begin_render_pass(&mut self, pass: RenderPassKind, render_area: Rect2D, clear_values: &[ClearValue]) -> Result<()> {
        (**self).begin_render_pass(pass, render_area, clear_values)
    }

    fn end_render_pass(&mut self) -> Result<()> {
        (**self).end_render_pass()
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        (**self).set_viewport(viewport)
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        (**self).set_scissor(scissor)
    }

    fn bind_pipeline(&mut self, pipeline: PipelineKind) -> Result<()> {
        (**self).bind_pipeline(pipeline)
    }

    fn bind_descriptor_set(&mut self, pipeline: PipelineKind) -> Result<()> {
        (**self).bind_descriptor_set(pipeline)
    }

    fn bind_texture(&mut self, texture: Option<TextureHandle>) -> Result<()> {
        (**self).bind_texture(texture)
    }

    fn push_constants(&mut self, stages: ShaderStages, offset: u32, data: &[u8]) -> Result<()> {
        (**self).push_constants(stages, offset, data)
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) -> Result<()> {
        (**self).bind_vertex_buffer(buffer, offset)
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64, index_type: IndexType) -> Result<()> {
        (**self).bind_index_buffer(buffer, offset, index_type)
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        (**self).draw(vertex_count, first_vertex)
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        (**self).draw_indexed(index_count, first_index, vertex_offset)
    }

    fn begin_label(&mut self, label: &str) -> Result<()> {
        (**self).begin_label(label)
    }

    fn end_label(&mut self) -> Result<()> {
        (**self).end_label()
    }
}

// ============================================================================
// Recording parameters
// ============================================================================

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with a 0..1 depth range
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

/// Render passes owned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPassKind {
    /// Depth-only pass into the shadow map
    Shadow,
    /// MSAA color + depth pass resolving into the swapchain image
    Main,
}

/// Pipelines of the pipeline set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Cubemap background: depth test, no depth write, always passes
    Sky,
    /// Lit geometry: depth test + write, alpha blending
    World,
    /// Depth-only geometry into the shadow map
    Shadow,
}

bitflags! {
    /// Shader stages that read a push constant range
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStages: u32 {
        const VERTEX = 0b01;
        const FRAGMENT = 0b10;
    }
}

// ============================================================================
// Shadow image barriers
// ============================================================================

/// Layouts the shadow depth image moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Contents undefined (only before the first shadow pass)
    Undefined,
    /// Writable as a depth attachment
    DepthAttachment,
    /// Readable from fragment shaders
    DepthReadOnly,
}

/// Pipeline stage at either side of a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierStage {
    TopOfPipe,
    EarlyFragmentTests,
    LateFragmentTests,
    FragmentShader,
}

/// Memory access at either side of a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierAccess {
    None,
    DepthAttachmentWrite,
    ShaderRead,
}

/// Depth-aspect image barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBarrier {
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_access: BarrierAccess,
    pub dst_access: BarrierAccess,
    pub src_stage: BarrierStage,
    pub dst_stage: BarrierStage,
}
