//! The registration handshake shared by all owning token variants.
//!
//! A [`HandlerSlot`] is the state a standalone token owns inline and a source
//! owns once per subscriber: the cancelled flag, the handler slot, and the
//! small state machine that serializes a consumer about to block against a
//! producer requesting cancellation.
//!
//! # The two-phase barrier
//!
//! The race this module exists to close: a producer has decided to invoke the
//! registered handler but has not finished doing so, while the waiter (woken
//! by that very handler) is already tearing its registration down. The
//! `Cancelling` state marks the producer's critical section; `unregister`
//! treats it as a barrier and waits on the internal condvar until the state
//! leaves `Cancelling`. Only then may the registration end, which is what
//! makes a dropped guard a hard guarantee that no further handler call will
//! ever be made.
//!
//! `cancel` invokes the handler with the slot mutex held (the handler
//! contract forbids re-entering the token, so this cannot deadlock). The
//! barrier is kept regardless: unregistration must not be reduced to a
//! nonblocking test-and-clear.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::handler::CancelHandler;
use crate::token::{RegisterResult, UnregisterResult};

/// Registration state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// No handler registered.
    Idle,
    /// A handler is registered and may be invoked by `cancel`.
    Registered,
    /// A producer is inside the handler's `cancel` right now.
    Cancelling,
}

struct SlotInner {
    state: SlotState,
    handler: Option<Arc<dyn CancelHandler>>,
    /// Whether the current registration episode's handler was invoked.
    /// Cleared on registration, set by `cancel`, read by `unregister`.
    cancel_ran: bool,
}

/// Cancelled flag + handler slot + the serialization around both.
pub(crate) struct HandlerSlot {
    /// Monotonic cancelled flag; readable without the mutex.
    cancelled: AtomicBool,
    inner: Mutex<SlotInner>,
    /// Notified whenever `state` leaves `Cancelling`.
    unblocked: Condvar,
}

impl HandlerSlot {
    pub(crate) fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            inner: Mutex::new(SlotInner {
                state: SlotState::Idle,
                handler: None,
                cancel_ran: false,
            }),
            unblocked: Condvar::new(),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Stores `handler` unless the slot is already cancelled.
    ///
    /// The caller must balance a `Registered` outcome with exactly one
    /// `unregister` before the handler's registration ends.
    pub(crate) fn try_register(&self, handler: Arc<dyn CancelHandler>) -> RegisterResult {
        let mut inner = self.lock_inner();
        if self.cancelled.load(Ordering::Relaxed) {
            return RegisterResult::AlreadyCancelled;
        }
        debug_assert_eq!(inner.state, SlotState::Idle, "double registration");
        debug_assert!(inner.handler.is_none());
        inner.handler = Some(handler);
        inner.state = SlotState::Registered;
        inner.cancel_ran = false;
        RegisterResult::Registered
    }

    /// Marks the slot cancelled and invokes the registered handler, if any.
    ///
    /// Idempotent; only the first call can observe a registered handler.
    /// Returns only after the cancelled flag is visible to `is_cancelled`
    /// observers and any handler invocation has fully completed.
    pub(crate) fn cancel(&self) {
        let mut inner = self.lock_inner();
        if self.cancelled.load(Ordering::Relaxed) {
            return;
        }
        self.cancelled.store(true, Ordering::Release);
        let had_handler = inner.state == SlotState::Registered;
        tracing::trace!(had_handler, "cancellation requested");
        if had_handler {
            inner.state = SlotState::Cancelling;
            if let Some(handler) = inner.handler.clone() {
                inner.cancel_ran = true;
                // Invoked with the mutex held; the handler contract forbids
                // re-entering this token from inside `cancel`.
                handler.cancel();
            }
            inner.state = SlotState::Idle;
            self.unblocked.notify_all();
        }
    }

    /// Removes the registered handler, waiting out an in-flight `cancel`.
    ///
    /// Reports whether this registration's handler was invoked so the caller
    /// can drive `reset` with no slot locks held.
    pub(crate) fn unregister(&self) -> UnregisterResult {
        let mut inner = self.lock_inner();
        while inner.state == SlotState::Cancelling {
            inner = match self.unblocked.wait(inner) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
        inner.handler = None;
        if inner.state == SlotState::Registered {
            inner.state = SlotState::Idle;
            return UnregisterResult::CancelDidNotRun;
        }
        if inner.cancel_ran {
            UnregisterResult::CancelRan
        } else {
            UnregisterResult::CancelDidNotRun
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, SlotInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for HandlerSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSlot")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingHandler {
        cancels: AtomicUsize,
    }

    impl CancelHandler for CountingHandler {
        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }

        fn reset(&self) {}
    }

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn register_then_unregister_fast_path() {
        init_test("register_then_unregister_fast_path");
        let slot = HandlerSlot::new();
        let handler = Arc::new(CountingHandler::default());

        let registered = slot.try_register(Arc::clone(&handler) as Arc<dyn CancelHandler>);
        crate::assert_with_log!(
            registered == RegisterResult::Registered,
            "first registration",
            RegisterResult::Registered,
            registered
        );

        let outcome = slot.unregister();
        crate::assert_with_log!(
            outcome == UnregisterResult::CancelDidNotRun,
            "no cancel ran",
            UnregisterResult::CancelDidNotRun,
            outcome
        );
        let count = handler.cancels.load(Ordering::SeqCst);
        crate::assert_with_log!(count == 0, "handler untouched", 0usize, count);

        // The slot is reusable for a fresh registration episode.
        let again = slot.try_register(handler as Arc<dyn CancelHandler>);
        crate::assert_with_log!(
            again == RegisterResult::Registered,
            "second registration",
            RegisterResult::Registered,
            again
        );
        slot.unregister();
        crate::test_complete!("register_then_unregister_fast_path");
    }

    #[test]
    fn cancel_invokes_registered_handler_once() {
        init_test("cancel_invokes_registered_handler_once");
        let slot = HandlerSlot::new();
        let handler = Arc::new(CountingHandler::default());

        slot.try_register(Arc::clone(&handler) as Arc<dyn CancelHandler>);
        slot.cancel();
        slot.cancel(); // idempotent

        let count = handler.cancels.load(Ordering::SeqCst);
        crate::assert_with_log!(count == 1, "exactly one invocation", 1usize, count);

        let outcome = slot.unregister();
        crate::assert_with_log!(
            outcome == UnregisterResult::CancelRan,
            "unregister reports the invocation",
            UnregisterResult::CancelRan,
            outcome
        );
        crate::test_complete!("cancel_invokes_registered_handler_once");
    }

    #[test]
    fn register_after_cancel_is_refused() {
        init_test("register_after_cancel_is_refused");
        let slot = HandlerSlot::new();
        slot.cancel();

        let handler = Arc::new(CountingHandler::default());
        let outcome = slot.try_register(Arc::clone(&handler) as Arc<dyn CancelHandler>);
        crate::assert_with_log!(
            outcome == RegisterResult::AlreadyCancelled,
            "registration refused",
            RegisterResult::AlreadyCancelled,
            outcome
        );
        let count = handler.cancels.load(Ordering::SeqCst);
        crate::assert_with_log!(count == 0, "handler never stored", 0usize, count);
        crate::test_complete!("register_after_cancel_is_refused");
    }

    #[test]
    fn cancel_with_empty_slot_only_sets_flag() {
        init_test("cancel_with_empty_slot_only_sets_flag");
        let slot = HandlerSlot::new();
        assert!(!slot.is_cancelled());
        slot.cancel();
        assert!(slot.is_cancelled());
        crate::test_complete!("cancel_with_empty_slot_only_sets_flag");
    }

    #[test]
    fn unregister_after_cancel_distinguishes_episodes() {
        init_test("unregister_after_cancel_distinguishes_episodes");
        let slot = HandlerSlot::new();
        let handler = Arc::new(CountingHandler::default());

        // Episode one: registered, never cancelled.
        slot.try_register(Arc::clone(&handler) as Arc<dyn CancelHandler>);
        let first = slot.unregister();
        crate::assert_with_log!(
            first == UnregisterResult::CancelDidNotRun,
            "episode one quiet",
            UnregisterResult::CancelDidNotRun,
            first
        );

        // Episode two: cancelled mid-registration.
        slot.try_register(handler as Arc<dyn CancelHandler>);
        slot.cancel();
        let second = slot.unregister();
        crate::assert_with_log!(
            second == UnregisterResult::CancelRan,
            "episode two fired",
            UnregisterResult::CancelRan,
            second
        );
        crate::test_complete!("unregister_after_cancel_distinguishes_episodes");
    }
}
