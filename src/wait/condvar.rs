//! Cancellable condition-variable waits.

use std::sync::{Arc, Condvar, MutexGuard};

use crate::guard::CancelGuard;
use crate::handler::CancelHandler;
use crate::token::CancelToken;

/// Wakes a condvar waiter. Notifying without the user's lock held is safe;
/// at worst it costs a spurious wakeup, which condvar waiters tolerate
/// anyway, so `reset` has nothing to undo.
struct CondvarWakeHandler {
    cv: Arc<Condvar>,
}

impl CancelHandler for CondvarWakeHandler {
    fn cancel(&self) {
        self.cv.notify_all();
    }

    fn reset(&self) {}
}

/// Blocks on `cv` until notified or until `token` is cancelled.
///
/// The mutex guard is released while blocked and re-acquired before the call
/// returns, exactly like [`Condvar::wait`]. Like the underlying wait this is
/// subject to spurious wakeups, so callers loop:
///
/// ```
/// # use ripcord::{StandaloneToken, CancelToken};
/// # use std::sync::{Arc, Condvar, Mutex};
/// # let token = StandaloneToken::new();
/// # token.cancel();
/// # let cv = Arc::new(Condvar::new());
/// # let state = Mutex::new(());
/// let mut guard = state.lock().expect("lock");
/// while !token.is_cancelled() {
///     guard = ripcord::wait(&cv, guard, &token);
/// }
/// ```
///
/// If the token is already cancelled, returns immediately without blocking.
/// The condition variable is shared with the cancelling thread through the
/// `Arc`, which is how the wake outlives this call's stack frame.
pub fn wait<'a, T>(
    cv: &Arc<Condvar>,
    guard: MutexGuard<'a, T>,
    token: &dyn CancelToken,
) -> MutexGuard<'a, T> {
    let handler: Arc<dyn CancelHandler> = Arc::new(CondvarWakeHandler {
        cv: Arc::clone(cv),
    });
    let registration = CancelGuard::new(token, handler);
    if registration.is_cancelled() {
        return guard;
    }
    // A cancel that lands between registration and the wait has already
    // notified; its wake would be lost because we are not blocked yet. The
    // flag is set before the notify, so re-checking here turns that wake
    // into an immediate return.
    if token.is_cancelled() {
        return guard;
    }
    match cv.wait(guard) {
        Ok(next) => next,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Blocks on `cv` until `condition` holds or `token` is cancelled.
///
/// Returns the re-acquired guard and the condition's final value: `true` when
/// the wait ended because the condition held, `false` when it ended because
/// of cancellation.
pub fn wait_until<'a, T, F>(
    cv: &Arc<Condvar>,
    mut guard: MutexGuard<'a, T>,
    token: &dyn CancelToken,
    mut condition: F,
) -> (MutexGuard<'a, T>, bool)
where
    F: FnMut(&mut T) -> bool,
{
    loop {
        if condition(&mut guard) {
            return (guard, true);
        }
        if token.is_cancelled() {
            return (guard, false);
        }
        guard = wait(cv, guard, token);
    }
}
