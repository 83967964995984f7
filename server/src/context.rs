//! Context provides a cancellation, similar to Golang's Context.
//!
//! One is shared by the poll loop, the metrics listener and the SIGINT
//! handler; cancelling it winds all of them down.

use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

#[derive(Clone, Debug, Default)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cv: Condvar,
}

impl Context {
    /// Create a new, uncancelled Context.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock can't leave a bool half-written.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancel the context, waking anyone waiting on it.
    pub fn cancel(&self) {
        *self.lock() = true;
        self.inner.cv.notify_all();
    }

    /// Returns true iff the context has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Wait until the context is cancelled.
    pub fn wait(&self) {
        let _cancelled = self
            .inner
            .cv
            .wait_while(self.lock(), |c| !*c)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Wait until the duration expires, or the context is cancelled.
    /// Returns true if the context has been cancelled.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (cancelled, _) = self
            .inner
            .cv
            .wait_timeout_while(self.lock(), duration, |c| !*c)
            .unwrap_or_else(PoisonError::into_inner);
        *cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn times_out() {
        let ctx = Context::new();
        assert!(!ctx.wait_timeout(Duration::from_millis(10)));
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn cancel_wakes_waiter() {
        let ctx = Context::new();
        let waiter = {
            let ctx = ctx.clone();
            std::thread::spawn(move || {
                let start = Instant::now();
                let cancelled = ctx.wait_timeout(Duration::from_secs(30));
                (cancelled, start.elapsed())
            })
        };
        std::thread::sleep(Duration::from_millis(20));
        ctx.cancel();
        let (cancelled, elapsed) = waiter.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(30));
    }

    #[test]
    fn wait_returns_on_cancel() {
        let ctx = Context::new();
        let waiter = {
            let ctx = ctx.clone();
            std::thread::spawn(move || ctx.wait())
        };
        std::thread::sleep(Duration::from_millis(20));
        ctx.cancel();
        waiter.join().unwrap();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn already_cancelled() {
        let ctx = Context::new();
        ctx.cancel();
        assert!(ctx.wait_timeout(Duration::from_secs(30)));
    }
}
