/// Renderer configuration - backend creation options and validation-layer settings

use std::path::PathBuf;

/// Sample count shared by the main color and depth attachments
pub const MSAA_SAMPLES: u32 = 4;

/// Side length of the square shadow depth map, in texels
pub const SHADOW_MAP_SIZE: u32 = 2048;

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Request the validation layer and debug messenger
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Present with FIFO instead of the lowest-latency mode available
    pub vsync: bool,
    /// Sample count for the main color/depth attachments
    pub msaa_samples: u32,
    /// Directory holding compiled shaders and `skyboxes.txt`.
    /// `None` walks up from the working directory looking for `Assets/Ready`.
    pub assets_root: Option<PathBuf>,
    /// Validation message handling
    pub debug: DebugConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Corebryo Application".to_string(),
            app_version: (1, 0, 0),
            vsync: true,
            msaa_samples: MSAA_SAMPLES,
            assets_root: None,
            debug: DebugConfig::default(),
        }
    }
}

/// Which validation messages reach the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Message categories to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Which validation layer messages are logged
///
/// Messages that pass go to the engine logger under `corebryo::vulkan::validation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugConfig {
    pub severity: DebugSeverity,
    pub message_filter: DebugMessageFilter,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            severity: DebugSeverity::ErrorsAndWarnings,
            message_filter: DebugMessageFilter::default(),
        }
    }
}
