//! Error types for the Corebryo engine
//!
//! This module defines the error types used throughout the engine,
//! including device bootstrap, resource creation, and skybox asset loading.

use std::fmt;

/// Result type for Corebryo engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Corebryo engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan command failure, lost surface, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (missing mesh, bad handle, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, renderer, subsystems)
    InitializationFailed(String),

    /// No physical device exposes a graphics queue family
    NoCapableDevice,

    /// Image, view, buffer or sampler creation failed
    ResourceCreation(String),

    /// Skybox catalog missing or unusable
    Catalog(String),

    /// HDR image could not be decoded
    ImageDecode(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::NoCapableDevice => write!(f, "No GPU with a graphics queue family"),
            Error::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            Error::Catalog(msg) => write!(f, "Skybox catalog error: {}", msg),
            Error::ImageDecode(msg) => write!(f, "Image decode error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` with the same text
///
/// # Example
///
/// ```no_run
/// # use corebryo_engine::engine_err;
/// let err = engine_err!("corebryo::vulkan", "Failed to create fence: {}", "oom");
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::corebryo::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

/// Log a WARN message and build an `Error::BackendError` with the same text
#[macro_export]
macro_rules! engine_warn_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_warn!($source, "{}", message);
        $crate::corebryo::Error::BackendError(message)
    }};
}

/// Log a WARN message and return `Err(Error::BackendError)` from the current function
#[macro_export]
macro_rules! engine_bail_warn {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_warn_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
