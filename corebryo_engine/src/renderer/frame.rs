/// Frame orchestrator
///
/// `FrameRenderer` drives one frame at a time through a `FrameDevice`:
/// wait for the in-flight fence, acquire an image, reset, record the shadow
/// pass and the main pass, submit, present.
///
/// Recording order inside the command buffer:
///
/// ```text
/// shadow barrier (Undefined | ReadOnly -> Attachment)
/// shadow pass    : every drawable item, light view-projection
/// shadow barrier (Attachment -> ReadOnly)
/// main pass      : skybox -> opaque -> transparent -> overlay
/// ```

use glam::Mat4;
use crate::camera::Camera;
use crate::{engine_trace, engine_warn};
use crate::error::Result;
use crate::renderer::{
    AcquireResult, BarrierAccess, BufferHandle, BarrierStage, ClearValue, CommandList, DepthBarrier, DrawItem,
    Extent2D, FrameDevice, ImageLayout, IndexType, LightTransform, MainPushConstants, Material,
    MeshBuffers, Overlay, PipelineKind, PresentResult, Rect2D, RenderPassKind, RenderStats,
    ShaderStages, ShadowPushConstants, SkyboxPushConstants, UniformBufferObject, Viewport,
    RENDER_MODE_LIT, SHADOW_MAP_SIZE, SKYBOX_VERTEX_COUNT,
};

/// Debug label of the shadow pass
pub const STAGE_SHADOW: &str = "Shadow";
pub const STAGE_SKYBOX: &str = "Skybox";
pub const STAGE_OPAQUE: &str = "Opaque";
/// Reserved for ordered blending, records nothing yet
pub const STAGE_TRANSPARENT: &str = "Transparent";
pub const STAGE_OVERLAY: &str = "Overlay";

/// Clears of the main pass: MSAA color, depth, resolve target
pub const MAIN_CLEAR_VALUES: [ClearValue; 3] = [
    ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
    ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
    ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
];

pub const SHADOW_CLEAR_VALUES: [ClearValue; 1] = [ClearValue::DepthStencil { depth: 1.0, stencil: 0 }];

/// Where the frame loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Acquiring,
    Recording,
    Submitted,
    Presented,
}

/// What happened to a `draw_frame` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Zero-area surface, nothing touched
    Skipped,
    /// Acquire reported an out-of-date swapchain
    SkippedStale,
    Presented,
    /// Submitted, but presentation asked for a resize
    PresentStale,
}

impl FrameOutcome {
    /// Whether the host should call `on_resize` before the next frame
    pub fn needs_resize(self) -> bool {
        matches!(self, FrameOutcome::SkippedStale | FrameOutcome::PresentStale)
    }
}

// ============================================================================
// Shadow image layout
// ============================================================================

/// Tracks the layout the shadow map is left in between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowLayoutTracker {
    layout: ImageLayout,
}

impl ShadowLayoutTracker {
    pub fn new() -> Self {
        Self { layout: ImageLayout::Undefined }
    }

    pub fn layout(&self) -> ImageLayout {
        self.layout
    }

    /// Barrier making the shadow map writable; its contents before the first
    /// frame are undefined, afterwards it comes from shader reads
    pub fn to_attachment(&mut self) -> DepthBarrier {
        let first_use = self.layout == ImageLayout::Undefined;
        self.layout = ImageLayout::DepthAttachment;

        DepthBarrier {
            old_layout: if first_use { ImageLayout::Undefined } else { ImageLayout::DepthReadOnly },
            new_layout: ImageLayout::DepthAttachment,
            src_access: if first_use { BarrierAccess::None } else { BarrierAccess::ShaderRead },
            dst_access: BarrierAccess::DepthAttachmentWrite,
            src_stage: if first_use { BarrierStage::TopOfPipe } else { BarrierStage::FragmentShader },
            dst_stage: BarrierStage::EarlyFragmentTests,
        }
    }

    /// Barrier making the freshly written shadow map readable by the world pipeline
    pub fn to_shader_read(&mut self) -> DepthBarrier {
        self.layout = ImageLayout::DepthReadOnly;

        DepthBarrier {
            old_layout: ImageLayout::DepthAttachment,
            new_layout: ImageLayout::DepthReadOnly,
            src_access: BarrierAccess::DepthAttachmentWrite,
            dst_access: BarrierAccess::ShaderRead,
            src_stage: BarrierStage::LateFragmentTests,
            dst_stage: BarrierStage::FragmentShader,
        }
    }
}

impl Default for ShadowLayoutTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FrameRenderer
// ============================================================================

/// Single-frame-in-flight orchestrator over a backend device
pub struct FrameRenderer<D: FrameDevice> {
    device: D,
    state: FrameState,
    extent: Extent2D,
    shadow_layout: ShadowLayoutTracker,
    items: Vec<DrawItem>,
    camera: Camera,
    light: LightTransform,
    overlay: Option<Box<dyn Overlay>>,
    stats: RenderStats,
    frame_time: f32,
    frames_presented: u64,
}

impl<D: FrameDevice> FrameRenderer<D> {
    pub fn new(device: D) -> Self {
        let extent = device.extent();
        Self {
            device,
            state: FrameState::Idle,
            extent,
            shadow_layout: ShadowLayoutTracker::new(),
            items: Vec::new(),
            camera: Camera::default(),
            light: LightTransform::fixed(),
            overlay: None,
            stats: RenderStats::default(),
            frame_time: 0.0,
            frames_presented: 0,
        }
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Consume the orchestrator and hand the device back
    pub fn into_device(self) -> D {
        self.device
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Extent frames are rendered at (zero while minimized)
    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn shadow_layout(&self) -> ImageLayout {
        self.shadow_layout.layout()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn light(&self) -> &LightTransform {
        &self.light
    }

    /// Stats of the last recorded frame
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Delta time passed to the last recorded frame
    pub fn frame_time(&self) -> f32 {
        self.frame_time
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn render_items(&self) -> &[DrawItem] {
        &self.items
    }

    // ===== INPUTS =====

    /// Replace the draw list consumed by the next frames
    pub fn set_render_items(&mut self, items: Vec<DrawItem>) {
        self.items = items;
    }

    pub fn set_overlay(&mut self, overlay: Option<Box<dyn Overlay>>) {
        self.overlay = overlay;
    }

    // ===== FRAME LOOP =====

    /// Record, submit and present one frame
    pub fn draw_frame(&mut self, delta_time: f32) -> Result<FrameOutcome> {
        if self.extent.is_zero() || self.device.extent().is_zero() {
            return Ok(FrameOutcome::Skipped);
        }

        let result = self.run_frame(delta_time);
        self.transition(FrameState::Idle);
        result
    }

    /// Apply a new surface size between frames
    ///
    /// A zero area only records the size; frames are skipped until a
    /// non-zero size arrives.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.extent = Extent2D::new(width, height);
        if self.extent.is_zero() {
            engine_trace!("corebryo::FrameRenderer", "Surface minimized, frames paused");
            return Ok(());
        }

        self.device.wait_idle()?;
        self.device.recreate_surface_resources(self.extent)?;
        self.extent = self.device.extent();
        engine_trace!(
            "corebryo::FrameRenderer",
            "Surface resources rebuilt at {}x{}",
            self.extent.width,
            self.extent.height
        );
        Ok(())
    }

    /// Drain the device, e.g. before dropping resources referenced by draw items
    pub fn wait_idle(&mut self) -> Result<()> {
        self.device.wait_idle()
    }

    fn run_frame(&mut self, delta_time: f32) -> Result<FrameOutcome> {
        self.transition(FrameState::Acquiring);
        self.device.wait_for_frame_fence()?;

        let image_index = match self.device.acquire_next_image()? {
            AcquireResult::Image(index) => index,
            AcquireResult::Stale => return Ok(FrameOutcome::SkippedStale),
        };

        self.transition(FrameState::Recording);
        self.device.reset_frame_fence()?;

        // Past the reset the fence only signals through a submission
        let (stats, shadow_layout) = match self.record_and_submit(image_index, delta_time) {
            Ok(recorded) => recorded,
            Err(err) => {
                if let Err(abandon_err) = self.device.abandon_frame() {
                    engine_warn!("corebryo::FrameRenderer", "Could not abandon failed frame: {}", abandon_err);
                }
                return Err(err);
            }
        };
        self.transition(FrameState::Submitted);

        self.shadow_layout = shadow_layout;
        self.stats = stats;
        self.frame_time = delta_time;

        let outcome = match self.device.present(image_index) {
            PresentResult::Presented => FrameOutcome::Presented,
            PresentResult::Stale => FrameOutcome::PresentStale,
        };
        self.transition(FrameState::Presented);
        self.frames_presented += 1;

        Ok(outcome)
    }

    /// Record both passes into the image's command buffer and submit it.
    /// The shadow layout is advanced on a copy, returned for the caller to
    /// commit once the GPU actually received the barriers.
    fn record_and_submit(&mut self, image_index: u32, delta_time: f32) -> Result<(RenderStats, ShadowLayoutTracker)> {
        let light_view_proj = self.light.view_projection();
        self.device.update_uniforms(&UniformBufferObject { light_view_proj })?;

        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_render_stats(self.stats);
            overlay.set_frame_time(delta_time);
        }

        let extent = self.device.extent();
        let skybox = if self.device.skybox_ready() {
            self.device.skybox_vertex_buffer()
        } else {
            None
        };
        let mut shadow_layout = self.shadow_layout;
        let to_attachment = shadow_layout.to_attachment();
        let to_shader_read = shadow_layout.to_shader_read();

        let stats = {
            let mut commands = self.device.commands(image_index)?;
            let mut recorder = FrameRecorder {
                commands: &mut commands,
                stats: RenderStats::default(),
            };

            recorder.commands.begin()?;
            recorder.commands.shadow_barrier(&to_attachment)?;
            recorder.shadow_pass(&self.items, light_view_proj)?;
            recorder.commands.shadow_barrier(&to_shader_read)?;
            recorder.main_pass(extent, &self.camera, &self.items, skybox, self.overlay.as_deref_mut())?;
            recorder.commands.end()?;
            recorder.stats
        };

        self.device.submit(image_index)?;
        Ok((stats, shadow_layout))
    }

    fn transition(&mut self, next: FrameState) {
        self.state = next;
    }
}

// ============================================================================
// Recording
// ============================================================================

/// Records the passes of one frame and counts what it draws
struct FrameRecorder<'a, C: CommandList> {
    commands: &'a mut C,
    stats: RenderStats,
}

impl<C: CommandList> FrameRecorder<'_, C> {
    fn shadow_pass(&mut self, items: &[DrawItem], light_view_proj: Mat4) -> Result<()> {
        let area = Rect2D::from_size(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE);

        self.commands.begin_label(STAGE_SHADOW)?;
        self.commands.begin_render_pass(RenderPassKind::Shadow, area, &SHADOW_CLEAR_VALUES)?;
        self.commands.bind_pipeline(PipelineKind::Shadow)?;
        self.commands.set_viewport(Viewport::full(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE))?;
        self.commands.set_scissor(area)?;

        for item in items {
            let Some(mesh) = item.drawable_mesh() else {
                continue;
            };

            self.commands.bind_vertex_buffer(mesh.vertex_buffer, 0)?;
            let push = ShadowPushConstants { light_view_proj, model: item.model };
            self.commands.push_constants(ShaderStages::VERTEX, 0, bytemuck::bytes_of(&push))?;
            self.draw_mesh(mesh)?;
        }

        self.commands.end_render_pass()?;
        self.commands.end_label()
    }

    fn main_pass(
        &mut self,
        extent: Extent2D,
        camera: &Camera,
        items: &[DrawItem],
        skybox: Option<BufferHandle>,
        overlay: Option<&mut (dyn Overlay + 'static)>,
    ) -> Result<()> {
        let area = Rect2D::from_size(extent.width, extent.height);

        self.commands.begin_render_pass(RenderPassKind::Main, area, &MAIN_CLEAR_VALUES)?;
        self.commands.set_viewport(Viewport::full(extent.width, extent.height))?;
        self.commands.set_scissor(area)?;

        if let Some(vertex_buffer) = skybox {
            self.skybox_stage(extent, camera, vertex_buffer)?;
        }
        self.opaque_stage(extent, camera, items)?;
        self.transparent_stage()?;

        if let Some(overlay) = overlay {
            self.commands.begin_label(STAGE_OVERLAY)?;
            overlay.record(&mut *self.commands)?;
            self.commands.end_label()?;
        }

        self.commands.end_render_pass()
    }

    /// Background cube around the camera, rotation only so it shows no parallax
    fn skybox_stage(&mut self, extent: Extent2D, camera: &Camera, vertex_buffer: BufferHandle) -> Result<()> {
        let push = SkyboxPushConstants {
            view_proj: camera.skybox_view_projection(extent),
            view_inverse: Mat4::IDENTITY,
        };

        self.commands.begin_label(STAGE_SKYBOX)?;
        self.commands.bind_pipeline(PipelineKind::Sky)?;
        self.commands.bind_descriptor_set(PipelineKind::Sky)?;
        self.commands.bind_vertex_buffer(vertex_buffer, 0)?;
        self.commands.push_constants(ShaderStages::VERTEX, 0, bytemuck::bytes_of(&push))?;
        self.commands.draw(SKYBOX_VERTEX_COUNT, 0)?;
        self.stats.draw_calls += 1;
        self.commands.end_label()
    }

    fn opaque_stage(&mut self, extent: Extent2D, camera: &Camera, items: &[DrawItem]) -> Result<()> {
        self.commands.begin_label(STAGE_OPAQUE)?;
        self.commands.bind_pipeline(PipelineKind::World)?;
        self.commands.bind_descriptor_set(PipelineKind::World)?;

        let default_material = Material::default();
        // The world set bound above holds the default texture
        let mut bound_texture = None;
        for item in items {
            let Some(mesh) = item.drawable_mesh() else {
                continue;
            };

            self.commands.bind_vertex_buffer(mesh.vertex_buffer, 0)?;
            let material = item.material.as_ref().unwrap_or(&default_material);
            if material.texture != bound_texture {
                self.commands.bind_texture(material.texture)?;
                bound_texture = material.texture;
            }
            let push = MainPushConstants::new(camera.mvp(item.model, extent), item.model, material, RENDER_MODE_LIT);
            self.commands.push_constants(
                ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                0,
                bytemuck::bytes_of(&push),
            )?;

            if let Some(count) = self.draw_mesh(mesh)? {
                self.stats.vertices += count;
                self.stats.triangles += count / 3;
            }
        }

        self.commands.end_label()
    }

    fn transparent_stage(&mut self) -> Result<()> {
        self.commands.begin_label(STAGE_TRANSPARENT)?;
        self.commands.end_label()
    }

    /// Indexed when the mesh has indices, otherwise non-indexed. A mesh that
    /// claims indices without an index buffer draws nothing.
    /// Returns the number of vertices consumed.
    fn draw_mesh(&mut self, mesh: &MeshBuffers) -> Result<Option<u32>> {
        if mesh.has_index && mesh.index_count > 0 {
            let Some(index_buffer) = mesh.index_buffer else {
                return Ok(None);
            };
            self.commands.bind_index_buffer(index_buffer, 0, IndexType::U32)?;
            self.commands.draw_indexed(mesh.index_count, 0, 0)?;
            self.stats.draw_calls += 1;
            return Ok(Some(mesh.index_count));
        }

        self.commands.draw(mesh.vertex_count, 0)?;
        self.stats.draw_calls += 1;
        Ok(Some(mesh.vertex_count))
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
