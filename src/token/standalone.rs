//! The single-slot owning token.

use std::sync::Arc;

use crate::handler::CancelHandler;
use crate::token::slot::HandlerSlot;
use crate::token::{CancelToken, RegisterResult, UnregisterResult};

/// A cancellation token that owns its own state.
///
/// Clones are lightweight handles onto the same shared state: any clone can
/// cancel, and all clones observe the cancellation. The token carries a
/// single handler slot, so only one waiter may have a guard registered on it
/// at a time.
///
/// Cancellation is one-shot and terminal; there is no way to re-arm a
/// cancelled token.
#[derive(Debug, Clone, Default)]
pub struct StandaloneToken {
    slot: Arc<HandlerSlot>,
}

impl StandaloneToken {
    /// Creates a token in the non-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Arc::new(HandlerSlot::new()),
        }
    }

    /// Requests cancellation.
    ///
    /// Returns only after the cancelled flag is visible to every clone and a
    /// registered handler's `cancel` (if any) has fully completed.
    pub fn cancel(&self) {
        self.slot.cancel();
    }
}

impl CancelToken for StandaloneToken {
    fn is_cancelled(&self) -> bool {
        self.slot.is_cancelled()
    }

    fn try_register(&self, handler: Arc<dyn CancelHandler>) -> RegisterResult {
        self.slot.try_register(handler)
    }

    fn unregister(&self) -> UnregisterResult {
        self.slot.unregister()
    }
}
