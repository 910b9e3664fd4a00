use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether the consumer of a fetch is still around to receive it.
///
/// Responses that arrive after [`kill`](Self::kill) are not written to the
/// store.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// For one-shot callers that never unmount
    pub fn detached() -> Self {
        Self::new()
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn kill(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let alive = Liveness::new();
        let other = alive.clone();
        alive.kill();
        assert!(!other.is_alive());
    }
}
