//! Integration tests for what the engine reports through its logger
//!
//! Each test swaps in a capturing logger and checks the entries produced by
//! the frame loop, the renderer singleton and the error macros.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use corebryo_engine::corebryo::{Engine, Error, Result};
use corebryo_engine::corebryo::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use corebryo_engine::corebryo::render::{
    AcquireResult, BufferHandle, ClearValue, CommandList, DepthBarrier, Extent2D, FrameDevice,
    FrameRenderer, IndexType, PipelineKind, PresentResult, Rect2D, RenderPassKind, ShaderStages,
    TextureHandle, UniformBufferObject, Viewport,
};
use corebryo_engine::{engine_bail, engine_err, engine_warn_err};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

// ============================================================================
// CAPTURE
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

/// Route engine logs into a shared vector until `reset_logger`
fn capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn from_source<'a>(entries: &'a [LogEntry], source: &str) -> Vec<&'a LogEntry> {
    entries.iter().filter(|e| e.source == source).collect()
}

// ============================================================================
// SCRIPTED BACKEND
// ============================================================================

struct NullCommands;

impl CommandList for NullCommands {
    fn begin(&mut self) -> Result<()> { Ok(()) }
    fn end(&mut self) -> Result<()> { Ok(()) }
    fn shadow_barrier(&mut self, _: &DepthBarrier) -> Result<()> { Ok(()) }
    fn begin_render_pass(&mut self, _: RenderPassKind, _: Rect2D, _: &[ClearValue]) -> Result<()> { Ok(()) }
    fn end_render_pass(&mut self) -> Result<()> { Ok(()) }
    fn set_viewport(&mut self, _: Viewport) -> Result<()> { Ok(()) }
    fn set_scissor(&mut self, _: Rect2D) -> Result<()> { Ok(()) }
    fn bind_pipeline(&mut self, _: PipelineKind) -> Result<()> { Ok(()) }
    fn bind_descriptor_set(&mut self, _: PipelineKind) -> Result<()> { Ok(()) }
    fn bind_texture(&mut self, _: Option<TextureHandle>) -> Result<()> { Ok(()) }
    fn push_constants(&mut self, _: ShaderStages, _: u32, _: &[u8]) -> Result<()> { Ok(()) }
    fn bind_vertex_buffer(&mut self, _: BufferHandle, _: u64) -> Result<()> { Ok(()) }
    fn bind_index_buffer(&mut self, _: BufferHandle, _: u64, _: IndexType) -> Result<()> { Ok(()) }
    fn draw(&mut self, _: u32, _: u32) -> Result<()> { Ok(()) }
    fn draw_indexed(&mut self, _: u32, _: u32, _: i32) -> Result<()> { Ok(()) }
}

/// Backend whose submit and abandon steps can be made to fail
struct ScriptedDevice {
    extent: Extent2D,
    fail_submit: bool,
    fail_abandon: bool,
}

impl ScriptedDevice {
    fn new() -> Self {
        Self { extent: Extent2D::new(640, 480), fail_submit: false, fail_abandon: false }
    }
}

impl FrameDevice for ScriptedDevice {
    type Commands<'a> = NullCommands;

    fn extent(&self) -> Extent2D { self.extent }
    fn image_count(&self) -> u32 { 2 }
    fn wait_for_frame_fence(&mut self) -> Result<()> { Ok(()) }
    fn acquire_next_image(&mut self) -> Result<AcquireResult> { Ok(AcquireResult::Image(0)) }
    fn reset_frame_fence(&mut self) -> Result<()> { Ok(()) }
    fn update_uniforms(&mut self, _: &UniformBufferObject) -> Result<()> { Ok(()) }
    fn commands(&mut self, _: u32) -> Result<Self::Commands<'_>> { Ok(NullCommands) }
    fn skybox_ready(&self) -> bool { false }
    fn skybox_vertex_buffer(&self) -> Option<BufferHandle> { None }

    fn submit(&mut self, _: u32) -> Result<()> {
        if self.fail_submit {
            engine_bail!("corebryo::scripted", "Device lost during submit");
        }
        Ok(())
    }

    fn abandon_frame(&mut self) -> Result<()> {
        if self.fail_abandon {
            return Err(Error::BackendError("fence stays unsignaled".to_string()));
        }
        Ok(())
    }

    fn present(&mut self, _: u32) -> PresentResult { PresentResult::Presented }
    fn wait_idle(&mut self) -> Result<()> { Ok(()) }

    fn recreate_surface_resources(&mut self, extent: Extent2D) -> Result<()> {
        self.extent = extent;
        Ok(())
    }
}

// ============================================================================
// FRAME LOOP
// ============================================================================

#[test]
#[serial]
fn test_integration_resize_is_traced() {
    let entries = capture();
    let mut renderer = FrameRenderer::new(ScriptedDevice::new());

    renderer.on_resize(0, 0).unwrap();
    renderer.on_resize(800, 600).unwrap();
    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    let frame_logs = from_source(&entries, "corebryo::FrameRenderer");
    assert_eq!(frame_logs.len(), 2);
    assert!(frame_logs.iter().all(|e| e.severity == LogSeverity::Trace));
    assert_eq!(frame_logs[0].message, "Surface minimized, frames paused");
    assert_eq!(frame_logs[1].message, "Surface resources rebuilt at 800x600");
}

#[test]
#[serial]
fn test_integration_failed_submit_is_logged_once() {
    let entries = capture();
    let mut device = ScriptedDevice::new();
    device.fail_submit = true;
    let mut renderer = FrameRenderer::new(device);

    let result = renderer.draw_frame(0.016);
    Engine::reset_logger();

    assert!(matches!(result, Err(Error::BackendError(msg)) if msg == "Device lost during submit"));
    let entries = entries.lock().unwrap();
    let device_logs = from_source(&entries, "corebryo::scripted");
    assert_eq!(device_logs.len(), 1);
    assert_eq!(device_logs[0].severity, LogSeverity::Error);
    assert!(device_logs[0].line.is_some());

    // A clean abandon stays silent
    assert!(from_source(&entries, "corebryo::FrameRenderer").is_empty());
}

#[test]
#[serial]
fn test_integration_abandon_failure_is_warned() {
    let entries = capture();
    let mut device = ScriptedDevice::new();
    device.fail_submit = true;
    device.fail_abandon = true;
    let mut renderer = FrameRenderer::new(device);

    // The submit error wins over the abandon error
    let result = renderer.draw_frame(0.016);
    Engine::reset_logger();

    assert!(matches!(result, Err(Error::BackendError(msg)) if msg.contains("submit")));
    let entries = entries.lock().unwrap();
    let warnings = from_source(&entries, "corebryo::FrameRenderer");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, LogSeverity::Warn);
    assert!(warnings[0].message.contains("fence stays unsignaled"));
}

// ============================================================================
// ENGINE SINGLETON
// ============================================================================

#[test]
#[serial]
fn test_integration_renderer_lifecycle_messages() {
    Engine::initialize().unwrap();
    Engine::destroy_renderer().unwrap();

    let entries = capture();
    assert!(Engine::renderer().is_err());
    Engine::create_renderer(FrameRenderer::new(ScriptedDevice::new())).unwrap();
    assert!(Engine::create_renderer(FrameRenderer::new(ScriptedDevice::new())).is_err());
    Engine::destroy_renderer().unwrap();
    Engine::reset_logger();

    let entries = entries.lock().unwrap();
    let engine_logs: Vec<(LogSeverity, &str)> = from_source(&entries, "corebryo::Engine")
        .iter()
        .map(|e| (e.severity, e.message.as_str()))
        .collect();
    assert_eq!(
        engine_logs,
        vec![
            (LogSeverity::Error, "Initialization failed: Renderer not created. Call Engine::create_renderer() first."),
            (LogSeverity::Info, "Renderer singleton created successfully"),
            (LogSeverity::Error, "Initialization failed: Renderer already exists. Call Engine::destroy_renderer() first."),
            (LogSeverity::Info, "Renderer singleton destroyed"),
        ]
    );
}

// ============================================================================
// ERROR MACROS
// ============================================================================

#[test]
#[serial]
fn test_integration_error_macros_log_what_they_return() {
    let entries = capture();
    let error = engine_err!("corebryo::vulkan", "Failed to create fence: {:?}", "ERROR_OUT_OF_HOST_MEMORY");
    let warning = engine_warn_err!("corebryo::vulkan", "Present skipped for image {}", 2);
    Engine::reset_logger();

    assert!(matches!(&error, Error::BackendError(msg) if msg == "Failed to create fence: \"ERROR_OUT_OF_HOST_MEMORY\""));
    assert!(matches!(&warning, Error::BackendError(msg) if msg == "Present skipped for image 2"));

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert!(entries[0].file.is_some_and(|file| file.ends_with("logging_integration_tests.rs")));
    assert_eq!(entries[1].severity, LogSeverity::Warn);
    assert_eq!(entries[1].message, "Present skipped for image 2");
    assert_eq!(entries[1].file, None);
}

// ============================================================================
// DEFAULT LOGGER
// ============================================================================

#[test]
fn test_integration_default_logger_threshold_and_format() {
    let logger = DefaultLogger::with_min_severity(LogSeverity::Warn);
    assert!(!logger.accepts(LogSeverity::Info));
    assert!(logger.accepts(LogSeverity::Warn));
    assert!(logger.accepts(LogSeverity::Error));

    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "corebryo::vulkan".to_string(),
        message: "Failed to submit frame 1".to_string(),
        file: Some("vulkan_renderer.rs"),
        line: Some(294),
    };
    let line = DefaultLogger::format_plain(&entry);
    assert!(line.contains("[ERROR] [corebryo::vulkan] Failed to submit frame 1 (vulkan_renderer.rs:294)"));
}
