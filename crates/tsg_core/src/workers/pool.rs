//! Thread pool for running workers.
//!
//! One OS thread per started work item. Items are shared by `Arc`, so a
//! worker outlives its `run()` call: the caller keeps its own handle and can
//! query or serialize the worker's series after the pool thread has exited.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

/// A unit of background work.
pub trait WorkItem: Send + Sync {
    /// Execute the work to completion or cancellation.
    fn run(&self);
}

/// Pool of worker threads, one per active item.
#[derive(Default)]
pub struct WorkerPool {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a work item on a new pool thread.
    ///
    /// The pool holds one `Arc` for the duration of the run; the caller's
    /// own handle stays valid afterwards.
    pub fn start(&self, item: Arc<dyn WorkItem>) {
        let handle = thread::Builder::new()
            .name("tsg-worker".to_string())
            .spawn(move || item.run())
            .expect("failed to spawn worker thread");
        self.handles.lock().push(handle);
    }

    /// Number of threads started and not yet joined.
    pub fn active_count(&self) -> usize {
        self.handles.lock().len()
    }

    /// Wait for all started items to finish.
    pub fn join_all(&self) {
        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.join() {
                tracing::error!("worker thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingItem {
        runs: AtomicUsize,
    }

    impl WorkItem for CountingItem {
        fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn pool_runs_items_and_keeps_them_alive() {
        let pool = WorkerPool::new();
        let item = Arc::new(CountingItem {
            runs: AtomicUsize::new(0),
        });

        pool.start(item.clone());
        pool.start(item.clone());
        pool.join_all();

        // Caller's handle is still usable after the runs completed
        assert_eq!(item.runs.load(Ordering::SeqCst), 2);
        assert_eq!(pool.active_count(), 0);
    }
}
