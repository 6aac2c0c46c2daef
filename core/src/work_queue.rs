//! Fixed-size worker pool with a reusable completion barrier.
//!
//! Every submitted task bumps a pending counter that the worker decrements
//! once the task is over, whether it returned `Ok`, returned `Err` or
//! panicked. [`WorkQueue::finish`] waits for the counter to reach zero and
//! can be called for each wave of work; [`WorkQueue::shutdown`] stops the
//! workers for good.

use crate::error::QueueError;
use anyhow::Result;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const DEFAULT_THREADS: usize = 5;

type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

#[derive(Default)]
struct Backlog {
    tasks: VecDeque<Task>,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    backlog: Mutex<Backlog>,
    available: Condvar,
    pending: Mutex<usize>,
    idle: Condvar,
}

impl Shared {
    fn complete(&self, finished: usize) {
        let mut pending = self.pending.lock();
        *pending -= finished;
        if *pending == 0 {
            self.idle.notify_all();
        }
    }
}

pub struct WorkQueue {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl WorkQueue {
    /// Starts `threads` workers; zero falls back to [`DEFAULT_THREADS`].
    pub fn new(threads: usize) -> Result<Self, QueueError> {
        let size = if threads == 0 { DEFAULT_THREADS } else { threads };
        let shared = Arc::new(Shared::default());
        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let shared = Arc::clone(&shared);
            let handle = thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || run_worker(id, &shared))?;
            workers.push(handle);
        }
        tracing::debug!(threads = size, "work queue started");
        Ok(Self { shared, workers: Mutex::new(workers), size })
    }

    pub fn size(&self) -> usize { self.size }

    /// Queues `task` for a worker and returns immediately.
    ///
    /// Errors and panics raised by the task are logged by the worker; the
    /// submitter never sees them.
    pub fn submit<F>(&self, task: F) -> Result<(), QueueError>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let mut backlog = self.shared.backlog.lock();
        if backlog.shutdown {
            return Err(QueueError::ShutDown);
        }
        *self.shared.pending.lock() += 1;
        backlog.tasks.push_back(Box::new(task));
        self.shared.available.notify_one();
        Ok(())
    }

    /// Blocks until every task submitted so far, including tasks submitted
    /// by other tasks, has completed. Must not be called from a task.
    pub fn finish(&self) {
        let mut pending = self.shared.pending.lock();
        while *pending > 0 {
            self.shared.idle.wait(&mut pending);
        }
    }

    pub fn pending(&self) -> usize { *self.shared.pending.lock() }

    /// Stops the workers after their current task and waits for them to exit.
    /// Tasks still queued are discarded. Calling it again is a no-op.
    pub fn shutdown(&self) {
        let discarded = {
            let mut backlog = self.shared.backlog.lock();
            backlog.shutdown = true;
            self.shared.available.notify_all();
            std::mem::take(&mut backlog.tasks)
        };
        let dropped = discarded.len();
        drop(discarded);
        if dropped > 0 {
            tracing::warn!(dropped, "discarding queued tasks at shutdown");
            self.shared.complete(dropped);
        }

        let current = thread::current().id();
        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            // the last owner may be a task running on one of the workers
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                tracing::error!("worker thread terminated abnormally");
            }
        }
    }
}

impl Drop for WorkQueue {
    fn drop(&mut self) { self.shutdown(); }
}

fn run_worker(id: usize, shared: &Shared) {
    loop {
        let task = {
            let mut backlog = shared.backlog.lock();
            loop {
                if backlog.shutdown {
                    return;
                }
                if let Some(task) = backlog.tasks.pop_front() {
                    break task;
                }
                shared.available.wait(&mut backlog);
            }
        };

        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(worker = id, error = %format!("{err:#}"), "task failed"),
            Err(_) => tracing::error!(worker = id, "task panicked"),
        }
        shared.complete(1);
    }
}
