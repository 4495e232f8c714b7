//! Global log switch and logging helpers.
//!
//! The interactive console silences logs while the prompt owns the terminal,
//! all crate log macros check the switch first.

use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(true);

#[inline(always)]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::SeqCst)
}

pub fn disable() {
    ENABLED.store(false, Ordering::SeqCst)
}

pub fn enable() {
    ENABLED.store(true, Ordering::SeqCst)
}

/// Direction of a traced protocol line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// Log a raw protocol line, used when protocol tracing is on.
pub fn trace_line(direction: Direction, origin: &str, line: &str) {
    let arrow = match direction {
        Direction::In => "<-",
        Direction::Out => "->",
    };
    crate::mib_debug!(target: "mi", "{origin} {arrow} {line}");
}

#[doc(hidden)]
#[macro_export]
macro_rules! _mib_log {
    ($log_fn: path, target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            $log_fn!(target: $target, $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! mib_info {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::_mib_log!(log::info, target: $target, $($arg)+)
    };
}

#[macro_export]
macro_rules! mib_warn {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::_mib_log!(log::warn, target: $target, $($arg)+)
    };
}

#[macro_export]
macro_rules! mib_error {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::_mib_log!(log::error, target: $target, $($arg)+)
    };
}

#[macro_export]
macro_rules! mib_debug {
    (target: $target:expr, $($arg:tt)+) => {
        $crate::_mib_log!(log::debug, target: $target, $($arg)+)
    };
}
