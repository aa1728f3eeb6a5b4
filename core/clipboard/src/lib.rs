//! Clipboard access with a single owned auto-clear timer.
//!
//! Copying a secret schedules a clear; copying again replaces the schedule,
//! so at most one clear is ever pending.

pub mod guard;
pub mod provider;

pub use guard::{ClearNotifier, ClipboardGuard, DEFAULT_CLEAR_TIMEOUT};
pub use provider::{ClipboardCommand, ClipboardProvider, CommandClipboard, MemoryClipboard};
