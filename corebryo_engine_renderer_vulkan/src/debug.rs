/// Validation messenger - forwards validation layer messages to the engine logger
///
/// Compiled only with the `vulkan-validation` feature. The messenger owns a
/// boxed `ValidationFilter` whose address is handed to the layer as user data,
/// so the callback needs no global state.

use ash::vk;
use corebryo_engine::corebryo::log::LogSeverity;
use corebryo_engine::corebryo::render::{DebugConfig, DebugMessageFilter, DebugSeverity};
use corebryo_engine::{engine_debug, engine_error, engine_info, engine_warn};
use std::borrow::Cow;
use std::ffi::{c_void, CStr};

const SOURCE: &str = "corebryo::vulkan::validation";

/// Which validation messages are logged, and at what level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationFilter {
    severity: DebugSeverity,
    categories: DebugMessageFilter,
}

impl ValidationFilter {
    pub fn new(debug: &DebugConfig) -> Self {
        Self {
            severity: debug.severity,
            categories: debug.message_filter,
        }
    }

    /// Severities the layer is asked to report at all
    pub fn severity_flags(&self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        type Flags = vk::DebugUtilsMessageSeverityFlagsEXT;
        match self.severity {
            DebugSeverity::ErrorsOnly => Flags::ERROR,
            DebugSeverity::ErrorsAndWarnings => Flags::ERROR | Flags::WARNING,
            DebugSeverity::All => Flags::ERROR | Flags::WARNING | Flags::INFO | Flags::VERBOSE,
        }
    }

    /// Message types the layer is asked to report
    pub fn type_flags(&self) -> vk::DebugUtilsMessageTypeFlagsEXT {
        type Flags = vk::DebugUtilsMessageTypeFlagsEXT;
        let mut flags = Flags::empty();
        if self.categories.show_general {
            flags |= Flags::GENERAL;
        }
        if self.categories.show_validation {
            flags |= Flags::VALIDATION;
        }
        if self.categories.show_performance {
            flags |= Flags::PERFORMANCE;
        }
        flags
    }

    /// Log level for a message, `None` when the filter drops it
    pub fn classify(
        &self,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    ) -> Option<LogSeverity> {
        if !self.severity_flags().intersects(severity) || !self.type_flags().intersects(message_type) {
            return None;
        }
        Some(log_severity(severity))
    }
}

fn log_severity(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Info
    } else {
        LogSeverity::Debug
    }
}

fn category(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "performance"
    } else {
        "general"
    }
}

unsafe fn text<'a>(ptr: *const std::os::raw::c_char, fallback: &'static str) -> Cow<'a, str> {
    if ptr.is_null() {
        Cow::Borrowed(fallback)
    } else {
        CStr::from_ptr(ptr).to_string_lossy()
    }
}

/// Debug messenger callback
///
/// `user_data` must point at the `ValidationFilter` the messenger was created with.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    user_data: *mut c_void,
) -> vk::Bool32 {
    let Some(filter) = (user_data as *const ValidationFilter).as_ref() else {
        return vk::FALSE;
    };
    let Some(level) = filter.classify(message_severity, message_type) else {
        return vk::FALSE;
    };
    let Some(data) = p_callback_data.as_ref() else {
        return vk::FALSE;
    };

    let id = text(data.p_message_id_name, "unnamed");
    let message = text(data.p_message, "no message");
    let kind = category(message_type);

    match level {
        LogSeverity::Error => engine_error!(SOURCE, "[{}] {}: {}", kind, id, message),
        LogSeverity::Warn => engine_warn!(SOURCE, "[{}] {}: {}", kind, id, message),
        LogSeverity::Info => engine_info!(SOURCE, "[{}] {}: {}", kind, id, message),
        _ => engine_debug!(SOURCE, "[{}] {}: {}", kind, id, message),
    }

    // Never ask the layer to abort the call
    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
