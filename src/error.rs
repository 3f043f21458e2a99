//! Error types for Ripcord.
//!
//! The error surface is deliberately narrow. Token operations never fail and
//! cancellation itself is not an error: a cancelled wait returns normally and
//! the caller inspects the token. Errors exist only where the crate touches
//! the operating system: fd polling and thread spawning.

use std::io;

/// Error returned by wait adapters and by [`CancelThread::spawn`].
///
/// [`CancelThread::spawn`]: crate::thread::CancelThread::spawn
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An underlying OS call failed inside a wait adapter.
    ///
    /// The token's state is unchanged by such failures and the guard still
    /// unregisters cleanly.
    #[error("i/o error in wait adapter: {0}")]
    Io(#[from] io::Error),

    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Result alias for fallible Ripcord operations.
pub type Result<T> = std::result::Result<T, Error>;
