//! Cancel-superseded request tokens for page rendering
//!
//! Every render request for a canvas is stamped with a monotonically
//! increasing token. When a newer request is issued before an older one
//! resolves, the older token stops being current and its result is
//! discarded on arrival. The canvas therefore always reflects the most
//! recently requested `(page, scale)` pair, never a stale intermediate one.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Token identifying one render request
///
/// Tokens are ordered: a larger value supersedes every smaller one issued
/// by the same [`RequestTokens`] source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Raw token value, mainly useful for logging
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonically increasing token source for one canvas
///
/// Clones share the same counter, so a worker holding a clone can check
/// whether its request is still current without coordinating with the
/// issuing side.
#[derive(Clone)]
pub struct RequestTokens {
    latest: Arc<AtomicU64>,
}

impl RequestTokens {
    /// Create a new token source
    ///
    /// No token is current until the first call to `issue()`.
    pub fn new() -> Self {
        Self {
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Issue a new token, superseding all previously issued ones
    pub fn issue(&self) -> RequestToken {
        let value = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        RequestToken(value)
    }

    /// Check whether a token is still the most recently issued one
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::Acquire) == token.0
    }

    /// Invalidate all outstanding tokens without issuing a new one
    ///
    /// Used when the document is replaced: pending render results for the
    /// old document must never reach the canvas.
    pub fn supersede_all(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for RequestTokens {
    fn default() -> Self {
        Self::new()
    }
}
