use std::sync::{Arc, Mutex};

type Waiter = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct GateState {
    pending: usize,
    waiter: Option<Waiter>,
}

/// Counts in-flight writes and fires a single stored continuation when the
/// count drops back to zero.
///
/// Writes from a superseded run keep their [`PendingWrite`] until they finish,
/// so a new run never resets the count.
#[derive(Clone, Default)]
pub struct CompletionGate {
    inner: Arc<Mutex<GateState>>,
}

impl CompletionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one in-flight write. Dropping the returned guard completes it.
    pub fn enter(&self) -> PendingWrite {
        self.inner.lock().unwrap().pending += 1;
        PendingWrite { inner: Arc::clone(&self.inner) }
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().pending
    }

    /// Run `callback` now when nothing is pending, otherwise once the last
    /// pending write completes. A later call replaces a callback still waiting.
    pub fn await_quiescence(&self, callback: impl FnOnce() + Send + 'static) {
        let mut state = self.inner.lock().unwrap();
        if state.pending == 0 {
            drop(state);
            callback();
            return;
        }
        if state.waiter.replace(Box::new(callback)).is_some() {
            tracing::debug!("Replacing a quiescence callback that had not fired yet");
        }
    }
}

/// Guard for one in-flight write.
pub struct PendingWrite {
    inner: Arc<Mutex<GateState>>,
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        let waiter = {
            let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            state.pending = state.pending.saturating_sub(1);
            if state.pending == 0 {
                state.waiter.take()
            } else {
                None
            }
        };
        // Called outside the lock so the callback may use the gate again.
        if let Some(waiter) = waiter {
            waiter();
        }
    }
}
