//! In-memory inverted index over text corpora and crawled pages, built and
//! searched concurrently on a hand-rolled worker pool and reader/writer lock.

pub mod builder;
pub mod concurrent;
pub mod error;
pub mod index;
pub mod json;
pub mod lock;
pub mod query;
pub mod tokenizer;
pub mod work_queue;

pub use concurrent::ConcurrentIndex;
pub use error::{LockError, QueueError};
pub use index::{InvertedIndex, Position, SearchResult};
pub use json::ResultSet;
pub use lock::ReadWriteLock;
pub use query::{ConcurrentQueryProcessor, QueryProcessor, SequentialQueryProcessor};
pub use work_queue::{WorkQueue, DEFAULT_THREADS};
