// Request generations - newest request per operation kind wins
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter handed out per request. A response is applied only
/// if no newer request of the same kind has started since.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    latest: AtomicU64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request and return its ticket.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}
