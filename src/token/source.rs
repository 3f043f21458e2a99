//! Multi-subscriber cancellation broadcast.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::handler::CancelHandler;
use crate::token::slot::HandlerSlot;
use crate::token::{CancelToken, RegisterResult, UnregisterResult};

struct SourceShared {
    /// The flag every sourced token reads.
    cancelled: AtomicBool,
    /// One handler slot per issued token.
    ///
    /// Lock order is strict: this source-level lock is always taken before
    /// any subscriber slot's lock, never the reverse.
    subscribers: Mutex<Vec<Arc<HandlerSlot>>>,
}

/// Broadcaster that produces cancellation tokens sharing one cancel state.
///
/// Each call to [`token`](CancelSource::token) creates a fresh subscriber
/// record, so every consumer gets its own handler slot while all of them
/// observe the same cancelled flag. [`cancel`](CancelSource::cancel) marks
/// the shared flag and then runs the registration handshake on every
/// subscriber in turn.
///
/// Clones are handles onto the same source.
#[derive(Clone, Default)]
pub struct CancelSource {
    shared: Arc<SourceShared>,
}

impl CancelSource {
    /// Creates a source in the non-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once [`cancel`](CancelSource::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    /// Creates a new token subscribed to this source.
    ///
    /// A token issued after cancellation is born cancelled.
    #[must_use]
    pub fn token(&self) -> SourcedToken {
        let mut subscribers = self.shared.subscribers.lock();
        let slot = Arc::new(HandlerSlot::new());
        if self.shared.cancelled.load(Ordering::Acquire) {
            slot.cancel();
        }
        subscribers.push(Arc::clone(&slot));
        SourcedToken {
            shared: Arc::clone(&self.shared),
            slot,
        }
    }

    /// Cancels every token this source has ever produced.
    ///
    /// Idempotent. Returns only after the shared flag is visible to every
    /// token and every registered handler has been invoked and has returned.
    pub fn cancel(&self) {
        let subscribers = self.shared.subscribers.lock();
        if self.shared.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(subscribers = subscribers.len(), "broadcasting cancellation");
        for slot in subscribers.iter() {
            slot.cancel();
        }
    }
}

impl fmt::Debug for CancelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSource")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// A cancellation token issued by a [`CancelSource`].
///
/// Lightweight handle onto the source's shared cancel state plus its own
/// subscriber record. The token cannot cancel anything itself; only the
/// source can. One consumer per token: a token carries a single handler
/// slot, so hand each waiter its own token rather than sharing one.
#[derive(Debug)]
pub struct SourcedToken {
    shared: Arc<SourceShared>,
    slot: Arc<HandlerSlot>,
}

impl CancelToken for SourcedToken {
    fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    fn try_register(&self, handler: Arc<dyn CancelHandler>) -> RegisterResult {
        // The shared flag may be set while the broadcast has not yet reached
        // this subscriber; refusing here spares the waiter a block-and-wake.
        if self.shared.cancelled.load(Ordering::Acquire) {
            return RegisterResult::AlreadyCancelled;
        }
        self.slot.try_register(handler)
    }

    fn unregister(&self) -> UnregisterResult {
        self.slot.unregister()
    }
}

impl fmt::Debug for SourceShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceShared")
            .field("cancelled", &self.cancelled.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Default for SourceShared {
    fn default() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }
}
