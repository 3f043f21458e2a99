//! Scoped handler registration.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::handler::CancelHandler;
use crate::token::{CancelToken, RegisterResult, UnregisterResult};

/// Scope object binding a handler to a token for one blocking call.
///
/// Construction attempts registration and records whether the token was
/// already cancelled; destruction guarantees the handler is unregistered and
/// will never again be referenced by the token, waiting out an in-flight
/// `cancel` invocation if one is running. If the handler's `cancel` ran
/// during the registration, the guard invokes `reset` (on this thread, with
/// no token locks held) before the drop returns.
///
/// The guard is `!Send`: it must be dropped on the thread that created it,
/// which is what lets handlers assume `reset` runs on the waiter's thread.
///
/// # Usage
///
/// ```
/// use ripcord::{CancelGuard, CancelHandler, StandaloneToken};
/// use std::sync::Arc;
///
/// struct Wake;
/// impl CancelHandler for Wake {
///     fn cancel(&self) { /* nudge the blocked primitive */ }
///     fn reset(&self) {}
/// }
///
/// let token = StandaloneToken::new();
/// let guard = CancelGuard::new(&token, Arc::new(Wake));
/// if !guard.is_cancelled() {
///     // safe to block; cancellation will invoke Wake::cancel
/// }
/// // dropping the guard tears the registration down race-free
/// ```
pub struct CancelGuard<'a> {
    token: &'a dyn CancelToken,
    handler: Option<Arc<dyn CancelHandler>>,
    cancelled_on_entry: bool,
    /// Keeps the guard on its creating thread.
    _not_send: PhantomData<*const ()>,
}

impl std::fmt::Debug for CancelGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelGuard")
            .field("cancelled_on_entry", &self.cancelled_on_entry)
            .field("registered", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> CancelGuard<'a> {
    /// Registers `handler` on `token` for the guard's lifetime.
    ///
    /// If the token is already cancelled, nothing is registered,
    /// [`is_cancelled`](CancelGuard::is_cancelled) reports true, and neither
    /// `cancel` nor `reset` will ever be called on the handler. The caller
    /// must not block in that case.
    pub fn new(token: &'a dyn CancelToken, handler: Arc<dyn CancelHandler>) -> Self {
        match token.try_register(Arc::clone(&handler)) {
            RegisterResult::Registered => Self {
                token,
                handler: Some(handler),
                cancelled_on_entry: false,
                _not_send: PhantomData,
            },
            RegisterResult::AlreadyCancelled => Self {
                token,
                handler: None,
                cancelled_on_entry: true,
                _not_send: PhantomData,
            },
        }
    }

    /// True if the token was already cancelled when the guard was created.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_on_entry
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            if self.token.unregister() == UnregisterResult::CancelRan {
                handler.reset();
            }
        }
    }
}
