/// Renderer trait - what the host and the engine singleton see of a backend

use crate::camera::Camera;
use crate::error::Result;
use crate::renderer::{DrawItem, FrameDevice, FrameOutcome, FrameRenderer, Overlay, RenderStats};

/// Frame-level rendering interface
///
/// The host feeds draw items, forwards window resizes between frames and
/// calls `draw_frame` once per tick.
pub trait Renderer: Send {
    /// Replace the items drawn by the next frames
    fn set_render_items(&mut self, items: Vec<DrawItem>);

    /// Record, submit and present one frame
    ///
    /// Stale swapchains are reported through the outcome, not as errors.
    fn draw_frame(&mut self, delta_time: f32) -> Result<FrameOutcome>;

    /// Rebuild surface-sized resources; zero sizes pause rendering
    fn on_resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Counters of the last recorded frame
    fn stats(&self) -> RenderStats;

    fn camera(&self) -> &Camera;

    fn camera_mut(&mut self) -> &mut Camera;

    /// Install (or remove) the overlay drawn at the end of the main pass
    fn set_overlay(&mut self, overlay: Option<Box<dyn Overlay>>);

    /// Block until the GPU is idle
    fn wait_idle(&mut self) -> Result<()>;
}

impl<D: FrameDevice + Send> Renderer for FrameRenderer<D> {
    fn set_render_items(&mut self, items: Vec<DrawItem>) {
        FrameRenderer::set_render_items(self, items)
    }

    fn draw_frame(&mut self, delta_time: f32) -> Result<FrameOutcome> {
        FrameRenderer::draw_frame(self, delta_time)
    }

    fn on_resize(&mut self, width: u32, height: u32) -> Result<()> {
        FrameRenderer::on_resize(self, width, height)
    }

    fn stats(&self) -> RenderStats {
        FrameRenderer::stats(self)
    }

    fn camera(&self) -> &Camera {
        FrameRenderer::camera(self)
    }

    fn camera_mut(&mut self) -> &mut Camera {
        FrameRenderer::camera_mut(self)
    }

    fn set_overlay(&mut self, overlay: Option<Box<dyn Overlay>>) {
        FrameRenderer::set_overlay(self, overlay)
    }

    fn wait_idle(&mut self) -> Result<()> {
        FrameRenderer::wait_idle(self)
    }
}
