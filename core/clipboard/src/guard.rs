//! Auto-clear timer for copied secrets.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use lockbox_common::Result;

use crate::provider::ClipboardProvider;

/// Default delay before a copied secret is cleared.
pub const DEFAULT_CLEAR_TIMEOUT: Duration = Duration::from_secs(30);

/// Callback run after a timer clears the clipboard.
pub type ClearNotifier = Arc<dyn Fn() + Send + Sync>;

struct Pending {
    generation: u64,
    cancel: Sender<()>,
}

#[derive(Default)]
struct TimerState {
    pending: Option<Pending>,
    next_generation: u64,
    on_clear: Option<ClearNotifier>,
}

impl TimerState {
    fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                // The timer thread may already be gone; nothing to wake then.
                let _ = pending.cancel.send(());
                debug!(generation = pending.generation, "clipboard clear cancelled");
                true
            }
            None => false,
        }
    }
}

struct Shared {
    provider: Arc<dyn ClipboardProvider>,
    state: Mutex<TimerState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer expiry. Clears only if this timer is still the pending one.
    ///
    /// The notifier runs after the state lock is released, so it may call
    /// back into the guard.
    fn expire(&self, generation: u64) {
        let notify = {
            let mut state = self.lock();
            if state.pending.as_ref().map(|p| p.generation) != Some(generation) {
                return;
            }
            state.pending = None;
            match self.provider.clear() {
                Ok(()) => {
                    info!(generation, "clipboard auto-cleared");
                    state.on_clear.clone()
                }
                Err(e) => {
                    warn!(error = %e, "clipboard auto-clear failed");
                    None
                }
            }
        };
        if let Some(notify) = notify {
            notify();
        }
    }
}

/// Owner of the one pending clipboard clear.
///
/// All timer bookkeeping sits behind a single mutex: starting a timer
/// cancels the previous one under the same lock, and an expiring timer
/// checks it is still current before clearing.
pub struct ClipboardGuard {
    shared: Arc<Shared>,
    timeout: Duration,
}

impl ClipboardGuard {
    /// Guard over `provider` clearing `timeout` after each copy. A zero
    /// timeout disables auto-clear.
    pub fn new(provider: impl ClipboardProvider + 'static, timeout: Duration) -> Self {
        Self::with_provider(Arc::new(provider), timeout)
    }

    pub fn with_provider(provider: Arc<dyn ClipboardProvider>, timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                provider,
                state: Mutex::new(TimerState::default()),
            }),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `notify` each time a timer auto-clears the clipboard, replacing
    /// any previous notifier. Explicit clears do not notify.
    pub fn set_on_clear(&self, notify: impl Fn() + Send + Sync + 'static) {
        self.shared.lock().on_clear = Some(Arc::new(notify));
    }

    /// Copy `text` and schedule its clear, replacing any pending clear.
    pub fn copy_with_clear(&self, text: &str) -> Result<()> {
        let mut state = self.shared.lock();
        state.cancel();
        self.shared.provider.copy(text)?;
        if !self.timeout.is_zero() {
            self.start_locked(&mut state)?;
        }
        Ok(())
    }

    /// Schedule a clear after the timeout, replacing any pending clear.
    pub fn start(&self) -> Result<()> {
        let mut state = self.shared.lock();
        state.cancel();
        self.start_locked(&mut state)
    }

    fn start_locked(&self, state: &mut TimerState) -> Result<()> {
        state.next_generation += 1;
        let generation = state.next_generation;
        let (cancel, cancelled) = mpsc::channel::<()>();
        let shared = Arc::clone(&self.shared);
        let timeout = self.timeout;

        thread::Builder::new()
            .name("clipboard-clear".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(timeout) {
                    shared.expire(generation);
                }
            })?;

        state.pending = Some(Pending { generation, cancel });
        debug!(generation, timeout_secs = timeout.as_secs(), "clipboard clear scheduled");
        Ok(())
    }

    /// Drop the pending clear without clearing. Returns whether one was
    /// pending.
    pub fn cancel(&self) -> bool {
        self.shared.lock().cancel()
    }

    /// Run the pending clear now. Returns whether one was pending.
    pub fn fire(&self) -> Result<bool> {
        let mut state = self.shared.lock();
        if !state.cancel() {
            return Ok(false);
        }
        self.shared.provider.clear()?;
        info!("clipboard cleared");
        Ok(true)
    }

    /// Cancel any pending clear and empty the clipboard unconditionally.
    pub fn clear_now(&self) -> Result<()> {
        let mut state = self.shared.lock();
        state.cancel();
        self.shared.provider.clear()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.lock().pending.is_some()
    }
}

impl Drop for ClipboardGuard {
    fn drop(&mut self) {
        match self.fire() {
            Ok(_) => {}
            Err(e) => warn!(error = %e, "clipboard clear on drop failed"),
        }
    }
}

impl std::fmt::Debug for ClipboardGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardGuard")
            .field("provider", &self.shared.provider.name())
            .field("timeout", &self.timeout)
            .field("pending", &self.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryClipboard;
    use std::time::Instant;

    fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        done()
    }

    #[test]
    fn test_timer_clears_after_timeout() {
        let clipboard = MemoryClipboard::new();
        let guard = ClipboardGuard::new(clipboard.clone(), Duration::from_millis(50));

        guard.copy_with_clear("hunter2").unwrap();
        assert_eq!(clipboard.contents(), "hunter2");
        assert!(guard.is_pending());

        assert!(wait_until(Duration::from_secs(5), || clipboard.contents().is_empty()));
        assert!(!guard.is_pending());
    }

    #[test]
    fn test_new_copy_replaces_pending_timer() {
        let clipboard = MemoryClipboard::new();
        let guard = ClipboardGuard::new(clipboard.clone(), Duration::from_secs(60));

        guard.copy_with_clear("first").unwrap();
        guard.copy_with_clear("second").unwrap();
        assert!(guard.is_pending());
        assert_eq!(clipboard.contents(), "second");

        assert!(guard.fire().unwrap());
        assert_eq!(clipboard.contents(), "");
        assert!(!guard.fire().unwrap());
    }

    #[test]
    fn test_auto_clear_notifies() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let clipboard = MemoryClipboard::new();
        let guard = ClipboardGuard::new(clipboard.clone(), Duration::from_millis(30));
        let cleared = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&cleared);
        guard.set_on_clear(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        guard.copy_with_clear("hunter2").unwrap();
        assert!(wait_until(Duration::from_secs(5), || cleared.load(Ordering::SeqCst) == 1));
        assert_eq!(clipboard.contents(), "");

        // Explicit clears stay silent.
        clipboard.copy("again").unwrap();
        guard.clear_now().unwrap();
        assert_eq!(clipboard.contents(), "");
        assert_eq!(cleared.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_keeps_contents() {
        let clipboard = MemoryClipboard::new();
        let guard = ClipboardGuard::new(clipboard.clone(), Duration::from_millis(30));

        guard.copy_with_clear("keep me").unwrap();
        assert!(guard.cancel());
        assert!(!guard.cancel());

        thread::sleep(Duration::from_millis(150));
        assert_eq!(clipboard.contents(), "keep me");
    }

    #[test]
    fn test_stale_timer_does_not_clear_new_copy() {
        let clipboard = MemoryClipboard::new();
        let guard = ClipboardGuard::new(clipboard.clone(), Duration::from_millis(40));

        guard.copy_with_clear("old").unwrap();
        guard.cancel();
        guard.shared.provider.copy("unrelated").unwrap();

        // Expiry of a generation that is no longer pending is ignored.
        guard.shared.expire(1);
        assert_eq!(clipboard.contents(), "unrelated");
    }

    #[test]
    fn test_clear_now_and_zero_timeout() {
        let clipboard = MemoryClipboard::new();
        let guard = ClipboardGuard::new(clipboard.clone(), Duration::ZERO);

        guard.copy_with_clear("pin").unwrap();
        assert!(!guard.is_pending());
        assert_eq!(clipboard.contents(), "pin");

        guard.clear_now().unwrap();
        assert_eq!(clipboard.contents(), "");
    }

    #[test]
    fn test_drop_clears_pending_secret() {
        let clipboard = MemoryClipboard::new();
        {
            let guard = ClipboardGuard::new(clipboard.clone(), Duration::from_secs(60));
            guard.copy_with_clear("secret").unwrap();
        }
        assert_eq!(clipboard.contents(), "");
    }
}
