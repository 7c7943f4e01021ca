// src/crawl/pool.rs
// =============================================================================
// A fixed-size pool the per-page subtasks run in.
//
// It's a semaphore with `size` permits: a task waits for a permit, runs, and
// gives the permit back when it finishes. However many subtasks a page
// starts, at most `size` of them are doing network or disk work at once.
// =============================================================================

use std::future::Future;
use tokio::sync::Semaphore;

#[derive(Debug)]
pub struct WorkerPool {
    permits: Semaphore,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Semaphore::new(size),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    // Runs `task` once a slot is free
    pub async fn run<F: Future>(&self, task: F) -> F::Output {
        // acquire() only fails on a closed semaphore, and we never close it
        let _permit = self.permits.acquire().await.ok();
        task.await
    }
}
