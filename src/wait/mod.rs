//! Cancellable blocking waits.
//!
//! Each adapter pairs one blocking primitive with a handler whose `cancel`
//! performs the smallest wake sufficient for that primitive, then drives the
//! standard guard-then-block sequence:
//!
//! 1. construct the handler for the primitive,
//! 2. register it on the token with a [`CancelGuard`](crate::CancelGuard),
//! 3. if the guard reports already-cancelled, return without blocking,
//! 4. otherwise block; cancellation wakes the primitive and the call
//!    returns normally,
//! 5. the guard unregisters on scope exit and drives `reset` if needed.
//!
//! Cancellation is never an error: the caller inspects the token after the
//! wait returns. Adapters fail only on underlying OS faults.

pub mod condvar;
pub mod sleep;

#[cfg(unix)]
pub mod poll;

pub use condvar::{wait, wait_until};
pub use sleep::sleep_for;

#[cfg(unix)]
pub use poll::poll;

/// Readiness interest flags for [`poll`].
///
/// Also used for the readiness reported back: an empty value means the wait
/// was cancelled before the target became ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interest(u8);

impl Interest {
    /// No readiness.
    pub const NONE: Interest = Interest(0);
    /// Interest in readable events.
    pub const READABLE: Interest = Interest(0b01);
    /// Interest in writable events.
    pub const WRITABLE: Interest = Interest(0b10);

    /// Returns interest in both readable and writable events.
    #[must_use]
    pub const fn both() -> Self {
        Interest(0b11)
    }

    /// Returns true if no flag is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if readable interest is set.
    #[must_use]
    pub const fn is_readable(&self) -> bool {
        self.0 & Self::READABLE.0 != 0
    }

    /// Returns true if writable interest is set.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.0 & Self::WRITABLE.0 != 0
    }

    /// Combines interests.
    #[must_use]
    pub const fn add(self, other: Interest) -> Self {
        Interest(self.0 | other.0)
    }

    /// Removes interest.
    #[must_use]
    pub const fn remove(self, other: Interest) -> Self {
        Interest(self.0 & !other.0)
    }
}
