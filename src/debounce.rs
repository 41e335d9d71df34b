//! Cancel-and-reschedule task used for debounced draft writes.
//!
//! Only the most recently scheduled value is ever delivered to the sink.
//! Scheduling aborts the previous timer task, and every task carries the
//! generation it was scheduled under, so a superseded task that already woke
//! up finds a newer generation and does nothing.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

type Sink<T> = Arc<dyn Fn(T) + Send + Sync>;

struct Slot<T> {
    generation: u64,
    pending: Option<T>,
}

pub struct Debouncer<T> {
    delay: Duration,
    sink: Sink<T>,
    slot: Arc<Mutex<Slot<T>>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, sink: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            sink: Arc::new(sink),
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                pending: None,
            })),
            task: None,
        }
    }

    /// Replace any pending value and restart the quiet period.
    ///
    /// Outside a Tokio runtime the value is delivered immediately.
    pub fn schedule(&mut self, value: T) {
        self.abort_task();

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.bump_generation();
            (self.sink)(value);
            return;
        };

        let generation = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.generation += 1;
            slot.pending = Some(value);
            slot.generation
        };

        let slot = Arc::clone(&self.slot);
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;
        self.task = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // The sink may do blocking I/O. The slot stays locked while it
            // runs so `cancel` and `flush` wait for an in-flight delivery.
            let delivery = tokio::task::spawn_blocking(move || {
                let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.generation != generation {
                    return;
                }
                if let Some(value) = slot.pending.take() {
                    sink(value);
                }
            });
            let _ = delivery.await;
        }));
    }

    /// Deliver the pending value now. Returns whether anything was pending.
    pub fn flush(&mut self) -> bool {
        self.abort_task();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        match slot.pending.take() {
            Some(value) => {
                (self.sink)(value);
                true
            }
            None => false,
        }
    }

    /// Discard the pending value without delivering it.
    ///
    /// Blocks until a delivery that has already started returns, so nothing
    /// reaches the sink after this call.
    pub fn cancel(&mut self) {
        self.abort_task();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        slot.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .is_some()
    }

    fn bump_generation(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.generation += 1;
        slot.pending = None;
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
