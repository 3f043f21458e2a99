//! Cancellation forwarding between tokens.

use std::sync::Arc;

use crate::guard::CancelGuard;
use crate::handler::CancelHandler;
use crate::token::{CancelSource, CancelToken, StandaloneToken};

/// The downstream side of a [`CancelChain`].
#[derive(Debug, Clone)]
pub enum ChainTarget {
    /// Forward to a standalone token.
    Token(StandaloneToken),
    /// Forward to a source, broadcasting to all of its tokens.
    Source(CancelSource),
}

impl ChainTarget {
    fn cancel(&self) {
        match self {
            Self::Token(token) => token.cancel(),
            Self::Source(source) => source.cancel(),
        }
    }
}

impl From<StandaloneToken> for ChainTarget {
    fn from(token: StandaloneToken) -> Self {
        Self::Token(token)
    }
}

impl From<CancelSource> for ChainTarget {
    fn from(source: CancelSource) -> Self {
        Self::Source(source)
    }
}

struct ChainHandler {
    downstream: ChainTarget,
}

impl CancelHandler for ChainHandler {
    fn cancel(&self) {
        self.downstream.cancel();
    }

    fn reset(&self) {}
}

/// While alive, forwards cancellation from an upstream token to a downstream
/// token or source.
///
/// The chain is an ordinary registration under the hood: the upstream token
/// sees the chain's internal handler no differently from any other, so
/// chaining composes with waits and nests freely. Dropping the chain
/// unregisters it; cancellation of the upstream after that no longer
/// propagates.
///
/// If the upstream is already cancelled when the chain is created, the
/// downstream is cancelled immediately.
///
/// Chaining a downstream back onto its own upstream (directly or through a
/// cycle of chains) is a programmer error and deadlocks.
#[derive(Debug)]
pub struct CancelChain<'a> {
    _guard: CancelGuard<'a>,
}

impl<'a> CancelChain<'a> {
    /// Installs a forwarding handler on `upstream` for the chain's lifetime.
    pub fn new(upstream: &'a dyn CancelToken, downstream: impl Into<ChainTarget>) -> Self {
        let downstream = downstream.into();
        let handler: Arc<dyn CancelHandler> = Arc::new(ChainHandler {
            downstream: downstream.clone(),
        });
        let guard = CancelGuard::new(upstream, handler);
        if guard.is_cancelled() {
            downstream.cancel();
        }
        Self { _guard: guard }
    }
}
