/// Corebryo Engine - global singletons (renderer and logger)
///
/// The renderer is registered once behind `Arc<Mutex<dyn Renderer>>` so that
/// tools and overlays can reach it; the frame loop itself stays on one thread.

use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::SystemTime;
use crate::error::{Error, Result};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::renderer::Renderer;

// ===== INTERNAL STATE =====

static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (starts as `DefaultLogger`)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

struct EngineState {
    renderer: RwLock<Option<Arc<Mutex<dyn Renderer>>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            renderer: RwLock::new(None),
        }
    }
}

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

// ===== PUBLIC API =====

/// Engine singleton manager
///
/// # Example
///
/// ```no_run
/// use corebryo_engine::corebryo::Engine;
/// use corebryo_engine_renderer_vulkan::VulkanRenderer;
///
/// # fn run(window: &winit::window::Window) -> corebryo_engine::corebryo::Result<()> {
/// Engine::initialize()?;
/// Engine::create_renderer(VulkanRenderer::new(window, Default::default())?)?;
///
/// let renderer = Engine::renderer()?;
/// // renderer.lock() ... draw_frame ...
///
/// Engine::shutdown();
/// # Ok(())
/// # }
/// ```
pub struct Engine;

impl Engine {
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("corebryo::Engine", "Initialization failed: {}", msg);
            }
            _ => {
                crate::engine_error!("corebryo::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            ))
        })
    }

    /// Initialize the engine. Idempotent.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Drop the renderer singleton (GPU resources are released here)
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut renderer) = state.renderer.write() {
                *renderer = None;
            }
        }
    }

    /// Wrap `renderer` and register it as the global renderer
    ///
    /// # Errors
    ///
    /// - The engine is not initialized
    /// - A renderer is already registered
    pub fn create_renderer<R: Renderer + 'static>(renderer: R) -> Result<()> {
        let renderer: Arc<Mutex<dyn Renderer>> = Arc::new(Mutex::new(renderer));
        Self::register_renderer(renderer)?;
        crate::engine_info!("corebryo::Engine", "Renderer singleton created successfully");
        Ok(())
    }

    pub(crate) fn register_renderer(renderer: Arc<Mutex<dyn Renderer>>) -> Result<()> {
        let state = Self::state()?;
        let mut lock = state.renderer.write().map_err(|_| {
            Self::log_and_return_error(Error::BackendError("Renderer lock poisoned".to_string()))
        })?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(Error::InitializationFailed(
                "Renderer already exists. Call Engine::destroy_renderer() first.".to_string(),
            )));
        }

        *lock = Some(renderer);
        Ok(())
    }

    /// The registered renderer
    pub fn renderer() -> Result<Arc<Mutex<dyn Renderer>>> {
        let state = Self::state()?;
        let lock = state.renderer.read().map_err(|_| {
            Self::log_and_return_error(Error::BackendError("Renderer lock poisoned".to_string()))
        })?;

        lock.clone().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Renderer not created. Call Engine::create_renderer() first.".to_string(),
            ))
        })
    }

    /// Unregister the renderer; outstanding `Arc`s keep it alive until dropped
    pub fn destroy_renderer() -> Result<()> {
        let state = Self::state()?;
        let mut lock = state.renderer.write().map_err(|_| {
            Self::log_and_return_error(Error::BackendError("Renderer lock poisoned".to_string()))
        })?;

        *lock = None;
        crate::engine_info!("corebryo::Engine", "Renderer singleton destroyed");
        Ok(())
    }

    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut renderer) = state.renderer.write() {
                *renderer = None;
            }
        }
    }

    // ===== LOGGING API =====

    /// Replace the global logger
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Go back to `DefaultLogger`
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Log without a source location (used by `engine_info!` and friends)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line (used by `engine_error!`)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
