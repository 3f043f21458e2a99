//! Cancellation tokens and the registration protocol.
//!
//! A token is an observable one-shot flag plus a registration slot for a wake
//! callback. Four variants share the [`CancelToken`] contract:
//!
//! | Variant | Purpose |
//! |---------|---------|
//! | [`DummyToken`] | never cancelled; registration is a free no-op |
//! | [`StandaloneToken`] | owns one handler slot; clonable shared handle |
//! | [`SourcedToken`] | per-subscriber handle onto a [`CancelSource`] |
//! | [`CancelChain`] | forwards cancellation from one token to another |
//!
//! Registration and unregistration are normally driven by
//! [`CancelGuard`](crate::guard::CancelGuard); the trait methods exist so the
//! guard can work over any variant by reference.

pub mod chain;
pub mod dummy;
pub mod source;
pub mod standalone;

pub(crate) mod slot;

pub use chain::{CancelChain, ChainTarget};
pub use dummy::DummyToken;
pub use source::{CancelSource, SourcedToken};
pub use standalone::StandaloneToken;

use std::sync::Arc;

use crate::handler::CancelHandler;

/// Outcome of attempting to register a handler on a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterResult {
    /// The handler is now registered; the caller may block. The matching
    /// `unregister` must run before the registration ends.
    Registered,
    /// The token was already cancelled; nothing was stored and the caller
    /// must not block.
    AlreadyCancelled,
}

/// Outcome of unregistering a handler from a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnregisterResult {
    /// The handler's `cancel` ran during this registration; the caller must
    /// now invoke `reset` (with no token locks held).
    CancelRan,
    /// The handler was never invoked; `reset` must be skipped.
    CancelDidNotRun,
}

/// Observable one-shot cancellation flag with a wake-callback slot.
///
/// `is_cancelled` is cheap enough to poll in a loop; the registration methods
/// are the waiter-side handshake and are exercised through
/// [`CancelGuard`](crate::guard::CancelGuard) rather than called directly.
pub trait CancelToken: Send + Sync {
    /// Returns true once cancellation has been requested. Monotonic: after
    /// the first true observation every later observation is true.
    fn is_cancelled(&self) -> bool;

    /// Attempts to register `handler` to be invoked on cancellation.
    ///
    /// Driven by [`CancelGuard`](crate::guard::CancelGuard). At most one
    /// handler may be registered on a token at a time; registering a second
    /// concurrently is a programmer error.
    fn try_register(&self, handler: Arc<dyn CancelHandler>) -> RegisterResult;

    /// Removes the registered handler, waiting out any in-flight `cancel`
    /// invocation first.
    ///
    /// Driven by [`CancelGuard`](crate::guard::CancelGuard). After this
    /// returns, the token will never call into the handler again.
    fn unregister(&self) -> UnregisterResult;
}
