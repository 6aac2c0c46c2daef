use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("read lock is not held by the current thread")]
    NotReading,
    #[error("write lock is not held by the current thread")]
    NotWriting,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("work queue has been shut down")]
    ShutDown,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
