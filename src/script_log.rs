//! Logging channel for behavior scripts.
//!
//! Script `print`/`debug` output is routed through the host's `log` facade
//! under the `script` target, with a per-frame message cap so a misbehaving
//! `update` handler cannot flood the log.

use std::sync::atomic::{AtomicU32, Ordering};

/// Maximum number of log messages allowed per frame.
const MAX_LOGS_PER_FRAME: u32 = 100;

/// Log messages emitted in the current frame.
static LOG_COUNT: AtomicU32 = AtomicU32::new(0);

/// Whether we've already warned about exceeding the limit this frame.
static WARNED_LIMIT: AtomicU32 = AtomicU32::new(0);

/// Log level for script messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
}

/// Reset the per-frame log counter. Called at the start of each tick.
pub fn reset_frame_log_count() {
    LOG_COUNT.store(0, Ordering::Relaxed);
    WARNED_LIMIT.store(0, Ordering::Relaxed);
}

/// Check if another message may be logged this frame.
fn can_log() -> bool {
    let count = LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= MAX_LOGS_PER_FRAME {
        // Only warn once per frame about exceeding the limit.
        if WARNED_LIMIT.swap(1, Ordering::Relaxed) == 0 {
            log::warn!(
                target: "script",
                "script log limit exceeded ({} messages/frame), further logs dropped",
                MAX_LOGS_PER_FRAME
            );
        }
        false
    } else {
        true
    }
}

/// Log a message from a script, respecting the per-frame limit.
pub fn script_log(level: LogLevel, message: &str) {
    if !can_log() {
        return;
    }
    match level {
        LogLevel::Info => log::info!(target: "script", "{}", message),
        LogLevel::Debug => log::debug!(target: "script", "{}", message),
    }
}
