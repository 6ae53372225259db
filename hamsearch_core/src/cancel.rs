use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a signal listener and the
/// search loop.
///
/// Only the loop acts on it: the listener sets the flag and the loop notices at
/// its next safe point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_cancellation() {
        let token = CancelToken::new();
        let listener_side = token.clone();
        assert!(!token.is_cancelled());

        std::thread::spawn(move || listener_side.cancel())
            .join()
            .unwrap();

        assert!(token.is_cancelled(), "Cancellation must be visible to clones");
    }
}
