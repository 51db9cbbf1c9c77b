//! Process-wide bookkeeping of open windows.

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

type LastClosedHook = Box<dyn Fn() + Send + Sync>;

/// Counts open windows and reacts when the last one closes.
///
/// Construct one per process and hand it to every window. The default hook
/// ends the process with exit code 0, so closing the final window ends the
/// program even if other threads are still running.
pub struct Lifecycle {
    open: Mutex<usize>,
    emptied: Condvar,
    on_last_closed: LastClosedHook,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("open", &*self.open.lock())
            .finish()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Exit the process once the last window closes.
    pub fn new() -> Self {
        Self::with_last_closed(|| {
            debug!("last window closed, exiting");
            std::process::exit(0);
        })
    }

    /// Run `hook` instead of exiting once the last window closes.
    pub fn with_last_closed(hook: impl Fn() + Send + Sync + 'static) -> Self {
        Lifecycle {
            open: Mutex::new(0),
            emptied: Condvar::new(),
            on_last_closed: Box::new(hook),
        }
    }

    /// Returns the number of open windows after registering.
    pub fn register_window(&self) -> usize {
        let mut open = self.open.lock();
        *open += 1;
        debug!(open = *open, "window registered");
        *open
    }

    /// Returns the number of open windows after unregistering. The hook runs
    /// while the count is still locked, so no registration can slip in
    /// between reaching zero and reacting to it.
    pub fn unregister_window(&self) -> usize {
        let mut open = self.open.lock();
        if *open == 0 {
            warn!("unregister_window called with no open windows");
            return 0;
        }
        *open -= 1;
        debug!(open = *open, "window unregistered");
        if *open == 0 {
            (self.on_last_closed)();
            self.emptied.notify_all();
        }
        *open
    }

    pub fn is_empty(&self) -> bool {
        *self.open.lock() == 0
    }

    pub fn open_windows(&self) -> usize {
        *self.open.lock()
    }

    /// Block until no window is open.
    pub fn wait_until_empty(&self) {
        let mut open = self.open.lock();
        while *open > 0 {
            self.emptied.wait(&mut open);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_hook_runs_only_at_zero() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        let lc = Lifecycle::with_last_closed(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });

        assert!(lc.is_empty());
        assert_eq!(lc.register_window(), 1);
        assert_eq!(lc.register_window(), 2);
        assert_eq!(lc.unregister_window(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!lc.is_empty());
        assert_eq!(lc.unregister_window(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(lc.is_empty());
    }

    #[test]
    fn test_unregister_underflow_is_ignored() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&fired);
        let lc = Lifecycle::with_last_closed(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(lc.unregister_window(), 0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wait_until_empty_wakes() {
        let lc = Arc::new(Lifecycle::with_last_closed(|| {}));
        lc.register_window();
        let waiter = {
            let lc = Arc::clone(&lc);
            std::thread::spawn(move || lc.wait_until_empty())
        };
        std::thread::sleep(std::time::Duration::from_millis(20));
        lc.unregister_window();
        waiter.join().unwrap();
        assert_eq!(lc.open_windows(), 0);
    }
}
