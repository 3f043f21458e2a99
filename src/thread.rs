//! A joinable worker that owns its cancellation token.

use std::thread::JoinHandle;

use crate::error::{Error, Result};
use crate::token::StandaloneToken;

struct ThreadInner {
    token: StandaloneToken,
    handle: JoinHandle<()>,
}

/// A worker thread coupled to a [`StandaloneToken`].
///
/// The body receives a clone of the token and is expected to observe it,
/// either polling it in a loop or blocking through the crate's wait adapters.
/// [`reset`](CancelThread::reset) and drop both cancel the token and then
/// join, so by the time either returns the worker has fully exited. The
/// token the body holds stays valid for the body's entire run.
///
/// A default-constructed handle carries no thread; `reset` on it is a no-op.
///
/// ```no_run
/// use ripcord::{CancelThread, CancelToken};
/// use std::time::Duration;
///
/// let worker = CancelThread::spawn(|token| {
///     while !token.is_cancelled() {
///         ripcord::sleep_for(Duration::from_secs(1), &token);
///     }
/// })?;
/// // going out of scope cancels and joins
/// drop(worker);
/// # Ok::<(), ripcord::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct CancelThread {
    inner: Option<ThreadInner>,
}

impl CancelThread {
    /// Creates an empty handle with no thread attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a worker running `body` with its own freshly-created token.
    pub fn spawn<F>(body: F) -> Result<Self>
    where
        F: FnOnce(StandaloneToken) + Send + 'static,
    {
        let token = StandaloneToken::new();
        let worker_token = token.clone();
        let handle = std::thread::Builder::new()
            .name("ripcord-worker".into())
            .spawn(move || body(worker_token))
            .map_err(Error::Spawn)?;
        Ok(Self {
            inner: Some(ThreadInner { token, handle }),
        })
    }

    /// True while a worker is attached (it may have finished running).
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns the worker's token, if a worker is attached.
    #[must_use]
    pub fn token(&self) -> Option<&StandaloneToken> {
        self.inner.as_ref().map(|inner| &inner.token)
    }

    /// Cancels the worker's token and joins the thread.
    ///
    /// Returns once the worker has fully exited; the handle is empty
    /// afterwards. A worker panic is contained here and logged, never
    /// propagated. No-op on an empty handle.
    pub fn reset(&mut self) {
        if let Some(inner) = self.inner.take() {
            inner.token.cancel();
            tracing::trace!("joining cancelled worker");
            if inner.handle.join().is_err() {
                tracing::error!("worker thread panicked before join");
            }
        }
    }
}

impl Drop for CancelThread {
    fn drop(&mut self) {
        self.reset();
    }
}

impl std::fmt::Debug for ThreadInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadInner")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use crate::token::CancelToken;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    fn polling_body(finished: Arc<AtomicBool>) -> impl FnOnce(StandaloneToken) + Send + 'static {
        move |token| {
            while !token.is_cancelled() {
                thread::sleep(Duration::from_millis(10));
            }
            finished.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn reset_cancels_and_joins() {
        init_test("reset_cancels_and_joins");
        let finished = Arc::new(AtomicBool::new(false));
        let mut worker = CancelThread::spawn(polling_body(Arc::clone(&finished))).expect("spawn");

        assert!(worker.is_attached());
        assert!(!finished.load(Ordering::SeqCst));

        worker.reset();
        assert!(finished.load(Ordering::SeqCst));
        assert!(!worker.is_attached());

        // A second reset is a no-op.
        worker.reset();
        crate::test_complete!("reset_cancels_and_joins");
    }

    #[test]
    fn drop_cancels_and_joins() {
        init_test("drop_cancels_and_joins");
        let finished = Arc::new(AtomicBool::new(false));
        {
            let _worker = CancelThread::spawn(polling_body(Arc::clone(&finished))).expect("spawn");
            assert!(!finished.load(Ordering::SeqCst));
        }
        assert!(finished.load(Ordering::SeqCst));
        crate::test_complete!("drop_cancels_and_joins");
    }

    #[test]
    fn empty_handle_is_inert() {
        init_test("empty_handle_is_inert");
        let mut handle = CancelThread::new();
        assert!(!handle.is_attached());
        assert!(handle.token().is_none());
        handle.reset();
        crate::test_complete!("empty_handle_is_inert");
    }

    #[test]
    fn worker_panic_is_contained() {
        init_test("worker_panic_is_contained");
        let mut worker = CancelThread::spawn(|_token| panic!("worker bug")).expect("spawn");
        thread::sleep(Duration::from_millis(20));
        worker.reset(); // must not propagate the panic
        crate::test_complete!("worker_panic_is_contained");
    }
}
