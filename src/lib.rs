//! Ripcord: cooperative cancellation primitives for blocking, thread-based code.
//!
//! # Overview
//!
//! Ripcord lets a thread that is blocked on a waitable resource (condition
//! variable, timed sleep, file-descriptor readiness) be woken promptly and
//! deterministically when another thread requests cancellation, without
//! forcible thread termination and without races between "register interest"
//! and "begin blocking".
//!
//! The heart of the crate is the handshake between a [`CancelToken`] and a
//! [`CancelHandler`], mediated by a stack-scoped [`CancelGuard`]: the waiter
//! registers a wake callback, blocks, and is guaranteed that after the guard
//! is gone the token will never call into the handler again, however
//! registration, cancellation, and unregistration interleave across threads.
//! Everything else is a thin adapter that plugs one blocking primitive into
//! that handshake.
//!
//! # Core Guarantees
//!
//! - **Monotonic cancellation**: once a token reports cancelled it stays
//!   cancelled for its whole lifetime
//! - **At most one wake per registration**: a registered handler's `cancel`
//!   runs at most once, and `reset` runs exactly when `cancel` ran
//! - **Race-free teardown**: dropping a guard waits out any in-flight wake,
//!   so the handler is safe to reuse or destroy afterwards
//! - **Cancellation is not an error**: cancelled waits return normally and
//!   the caller inspects the token
//!
//! # Module Structure
//!
//! - [`token`]: the token variants (dummy, standalone, sourced, chained) and
//!   the registration state machine
//! - [`guard`]: scoped handler registration
//! - [`handler`]: the wake-callback contract
//! - [`wait`]: cancellable condition-variable waits, sleeps, and fd polling
//! - [`thread`]: a joinable worker that cancels its own token and joins on
//!   reset or drop
//! - [`error`]: error types for adapter and spawn faults
//!
//! # Example
//!
//! ```
//! use ripcord::{StandaloneToken, CancelToken};
//! use std::sync::{Arc, Condvar, Mutex};
//!
//! let token = StandaloneToken::new();
//! let cv = Arc::new(Condvar::new());
//! let state = Arc::new(Mutex::new(()));
//!
//! let worker = {
//!     let (token, cv, state) = (token.clone(), Arc::clone(&cv), Arc::clone(&state));
//!     std::thread::spawn(move || {
//!         let mut guard = state.lock().expect("lock");
//!         while !token.is_cancelled() {
//!             guard = ripcord::wait(&cv, guard, &token);
//!         }
//!     })
//! };
//!
//! token.cancel();
//! worker.join().expect("worker exits promptly");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod error;
pub mod guard;
pub mod handler;
pub mod test_utils;
pub mod thread;
pub mod token;
pub mod wait;

pub use error::{Error, Result};
pub use guard::CancelGuard;
pub use handler::CancelHandler;
pub use thread::CancelThread;
pub use token::{
    CancelChain, CancelSource, CancelToken, ChainTarget, DummyToken, RegisterResult,
    SourcedToken, StandaloneToken, UnregisterResult,
};
#[cfg(unix)]
pub use wait::poll;
pub use wait::{sleep_for, wait, wait_until, Interest};
