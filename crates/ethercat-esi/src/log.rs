// crates/ethercat-esi/src/log.rs

use crate::types::DeviceIdentity;
use alloc::format;
use alloc::string::String;

/// Trait for structs that provide metadata for logging
pub trait LogMetadata {
    fn meta(&self) -> String;
}

/// Tags log lines with the component and the device being configured.
#[derive(Debug, Clone, Copy)]
pub struct LogContext {
    pub component: &'static str,
    pub identity: DeviceIdentity,
}

impl LogContext {
    pub const fn new(component: &'static str, identity: DeviceIdentity) -> Self {
        Self {
            component,
            identity,
        }
    }
}

impl LogMetadata for LogContext {
    fn meta(&self) -> String {
        format!(
            "component={}, vendor={:#X}, product={:#X}, revision={:#X}",
            self.component,
            self.identity.vendor_id,
            self.identity.product_code,
            self.identity.revision
        )
    }
}

// =============================================
// Logging Macros (namespaced under crate::log)
// =============================================

// ===== esi_info! =====
macro_rules! esi_info {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::info!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== esi_warn! =====
macro_rules! esi_warn {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::warn!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== esi_debug! =====
macro_rules! esi_debug {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::debug!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== esi_trace! =====
macro_rules! esi_trace {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        log::trace!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// Re-export macros for use in other files
pub(crate) use esi_debug;
pub(crate) use esi_info;
pub(crate) use esi_trace;
pub(crate) use esi_warn;
