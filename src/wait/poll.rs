//! Cancellable file-descriptor readiness polling.
//!
//! The adapter watches a single fd through its own short-lived [`Poller`];
//! the handler's `cancel` uses the poller's built-in cross-thread notify as
//! the wake, so the waiter returns from `wait` with no readiness on the
//! target and reports the cancellation as an empty [`Interest`]. The
//! notification is consumed by the very wait it interrupts, leaving nothing
//! for `reset` to restore.

use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::sync::Arc;

use polling::{Event, Poller};

use crate::error::Result;
use crate::guard::CancelGuard;
use crate::handler::CancelHandler;
use crate::token::CancelToken;
use crate::wait::Interest;

/// Key identifying the watched fd among the poller's events.
const FD_KEY: usize = 0;

struct PollWakeHandler {
    poller: Arc<Poller>,
}

impl CancelHandler for PollWakeHandler {
    fn cancel(&self) {
        if let Err(error) = self.poller.notify() {
            // Nothing to do about it from the cancelling thread; the waiter
            // still observes the token as cancelled on its next loop.
            tracing::warn!(%error, "failed to wake poller");
        }
    }

    fn reset(&self) {}
}

/// Blocks until `fd` reports readiness matching `interest` or `token` is
/// cancelled.
///
/// On cancellation the returned readiness is [`Interest::NONE`]; the target
/// fd's state is untouched. A token cancelled before the call returns
/// [`Interest::NONE`] without blocking. Errors are underlying OS faults
/// only, never cancellation; the registration still tears down cleanly when
/// one occurs.
pub fn poll<F: AsRawFd>(fd: &F, interest: Interest, token: &dyn CancelToken) -> Result<Interest> {
    let poller = Arc::new(Poller::new()?);
    let raw = fd.as_raw_fd();
    poller.add(raw, to_event(interest))?;

    let handler: Arc<dyn CancelHandler> = Arc::new(PollWakeHandler {
        poller: Arc::clone(&poller),
    });
    let registration = CancelGuard::new(token, handler);
    let ready = if registration.is_cancelled() {
        Ok(Interest::NONE)
    } else {
        wait_for_readiness(&poller, raw, interest, token)
    };
    let _ = poller.delete(raw);
    ready.map_err(Into::into)
}

fn wait_for_readiness(
    poller: &Poller,
    raw: RawFd,
    interest: Interest,
    token: &dyn CancelToken,
) -> io::Result<Interest> {
    let mut events = Vec::with_capacity(1);
    loop {
        events.clear();
        match poller.wait(&mut events, None) {
            Ok(_) => {}
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
        if token.is_cancelled() {
            return Ok(Interest::NONE);
        }
        if let Some(ready) = events
            .iter()
            .filter(|event| event.key == FD_KEY)
            .map(|event| readiness_of(*event))
            .find(|ready| !ready.is_empty())
        {
            return Ok(ready);
        }
        // Spurious wake; the poller is oneshot, so re-arm before re-waiting.
        poller.modify(raw, to_event(interest))?;
    }
}

fn to_event(interest: Interest) -> Event {
    match (interest.is_readable(), interest.is_writable()) {
        (true, true) => Event::all(FD_KEY),
        (true, false) => Event::readable(FD_KEY),
        (false, true) => Event::writable(FD_KEY),
        (false, false) => Event::none(FD_KEY),
    }
}

fn readiness_of(event: Event) -> Interest {
    let mut ready = Interest::NONE;
    if event.readable {
        ready = ready.add(Interest::READABLE);
    }
    if event.writable {
        ready = ready.add(Interest::WRITABLE);
    }
    ready
}
