//! Cancellable timed sleep.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::guard::CancelGuard;
use crate::handler::CancelHandler;
use crate::token::CancelToken;

/// Internal alarm the sleeper blocks on; cancellation trips it.
struct SleepAlarm {
    fired: Mutex<bool>,
    cv: Condvar,
}

struct SleepWakeHandler {
    alarm: Arc<SleepAlarm>,
}

impl CancelHandler for SleepWakeHandler {
    fn cancel(&self) {
        // The alarm lock is only ever held transiently; the sleeper never
        // touches the token while holding it.
        let mut fired = match self.alarm.fired.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *fired = true;
        self.alarm.cv.notify_all();
    }

    fn reset(&self) {}
}

/// Sleeps for `duration` unless `token` is cancelled first.
///
/// Returns as soon as either the full duration has elapsed (measured against
/// a steady clock, robust to spurious wakeups) or cancellation fires. A
/// token cancelled before the call returns immediately. The caller inspects
/// the token to distinguish the two outcomes.
pub fn sleep_for(duration: Duration, token: &dyn CancelToken) {
    let alarm = Arc::new(SleepAlarm {
        fired: Mutex::new(false),
        cv: Condvar::new(),
    });
    let handler: Arc<dyn CancelHandler> = Arc::new(SleepWakeHandler {
        alarm: Arc::clone(&alarm),
    });
    let registration = CancelGuard::new(token, handler);
    if registration.is_cancelled() {
        return;
    }

    let deadline = Instant::now() + duration;
    let mut fired = match alarm.fired.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    while !*fired {
        let now = Instant::now();
        let Some(remaining) = deadline.checked_duration_since(now).filter(|d| !d.is_zero())
        else {
            break;
        };
        let (next, _timed_out) = match alarm.cv.wait_timeout(fired, remaining) {
            Ok(woken) => woken,
            Err(poisoned) => poisoned.into_inner(),
        };
        fired = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use crate::token::{DummyToken, StandaloneToken};
    use std::thread;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn full_sleep_without_cancellation() {
        init_test("full_sleep_without_cancellation");
        let started = Instant::now();
        sleep_for(Duration::from_millis(50), &DummyToken::new());
        let elapsed = started.elapsed();
        crate::assert_with_log!(
            elapsed >= Duration::from_millis(50),
            "slept the full duration",
            Duration::from_millis(50),
            elapsed
        );
        crate::test_complete!("full_sleep_without_cancellation");
    }

    #[test]
    fn cancel_cuts_a_long_sleep_short() {
        init_test("cancel_cuts_a_long_sleep_short");
        let token = StandaloneToken::new();
        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                token.cancel();
            })
        };

        let started = Instant::now();
        sleep_for(Duration::from_secs(60), &token);
        let elapsed = started.elapsed();
        crate::assert_with_log!(
            elapsed < Duration::from_secs(3),
            "woke long before the minute",
            Duration::from_secs(3),
            elapsed
        );
        assert!(token.is_cancelled());
        canceller.join().expect("canceller");
        crate::test_complete!("cancel_cuts_a_long_sleep_short");
    }

    #[test]
    fn sleep_on_cancelled_token_returns_at_once() {
        init_test("sleep_on_cancelled_token_returns_at_once");
        let token = StandaloneToken::new();
        token.cancel();

        let started = Instant::now();
        sleep_for(Duration::from_secs(60), &token);
        let elapsed = started.elapsed();
        crate::assert_with_log!(
            elapsed < Duration::from_secs(1),
            "no blocking on a dead token",
            Duration::from_secs(1),
            elapsed
        );
        crate::test_complete!("sleep_on_cancelled_token_returns_at_once");
    }
}
