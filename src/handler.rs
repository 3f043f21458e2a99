//! Waiter-supplied wake callbacks.

/// Callback pair a waiter supplies so cancellation can interrupt its specific
/// blocking call.
///
/// A handler is registered on a token for the duration of one blocking call
/// (see [`CancelGuard`]). When the token is cancelled while the handler is
/// registered, the producer thread invokes [`cancel`]; after the waiter has
/// returned from blocking, its guard invokes [`reset`] to undo any transient
/// state the wake introduced.
///
/// # Contract
///
/// `cancel` is called with the token's internal coordination lock held. It
/// must be non-blocking, must not call back into the token, and must not
/// acquire locks that a waiter could hold while touching the token. It should
/// perform the smallest signal sufficient to wake the waiter: notify a
/// condition variable, wake a poller, set a flag the waiter will observe.
///
/// `reset` is called with no token locks held, on the thread that owns the
/// guard, and may perform arbitrary cleanup. It runs exactly when `cancel`
/// ran for that registration.
///
/// [`CancelGuard`]: crate::guard::CancelGuard
/// [`cancel`]: CancelHandler::cancel
/// [`reset`]: CancelHandler::reset
pub trait CancelHandler: Send + Sync {
    /// Wakes the blocked waiter. Invoked by the cancelling thread.
    fn cancel(&self);

    /// Restores any transient state `cancel` set. Invoked by the waiter's
    /// thread after blocking returned.
    fn reset(&self);
}
