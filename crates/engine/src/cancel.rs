//! Cooperative cancellation for in-flight rasterization.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag handed to a rasterizer call.
///
/// Clones share the underlying flag: cancelling any clone cancels them all.
/// A backend should poll [`is_cancelled`](Self::is_cancelled) at convenient
/// points and return without producing a raster once it reads `true`.
/// Callers additionally gate canvas mutation on the token, so a backend
/// that never polls still cannot cause a stale write.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A fresh, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the token. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
