//! Turns query files into memoized, ranked result sets.
//!
//! A line's key is its sorted distinct stems joined by single spaces; lines
//! that produce a key already in the result set are not searched again.

use crate::concurrent::ConcurrentIndex;
use crate::index::InvertedIndex;
use crate::json::{self, ResultSet};
use crate::tokenizer;
use crate::work_queue::WorkQueue;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

pub trait QueryProcessor {
    /// Processes every line of the query file at `path`.
    fn process_file(&mut self, path: &Path, exact: bool) -> Result<()>;

    fn process_line(&mut self, line: &str, exact: bool);

    fn results(&self) -> ResultSet;

    fn write_results(&self, path: &Path) -> Result<()> {
        json::write_results(&self.results(), path)
    }
}

/// Sorted distinct stems of `line` and the key they form.
pub fn query_key(line: &str) -> (BTreeSet<String>, String) {
    let stems = tokenizer::unique_stems(line);
    let key = stems.iter().map(String::as_str).collect::<Vec<_>>().join(" ");
    (stems, key)
}

fn read_lines(path: &Path) -> Result<impl Iterator<Item = std::io::Result<String>>> {
    let file = File::open(path).with_context(|| format!("failed to open query file {}", path.display()))?;
    Ok(BufReader::new(file).lines())
}

pub struct SequentialQueryProcessor<'a> {
    index: &'a InvertedIndex,
    results: ResultSet,
}

impl<'a> SequentialQueryProcessor<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self { Self { index, results: ResultSet::new() } }
}

impl QueryProcessor for SequentialQueryProcessor<'_> {
    fn process_file(&mut self, path: &Path, exact: bool) -> Result<()> {
        for line in read_lines(path)? {
            let line = line.with_context(|| format!("failed to read query file {}", path.display()))?;
            self.process_line(&line, exact);
        }
        tracing::info!(queries = self.results.len(), "query file processed");
        Ok(())
    }

    fn process_line(&mut self, line: &str, exact: bool) {
        let (stems, key) = query_key(line);
        if stems.is_empty() || self.results.contains_key(&key) {
            return;
        }
        let found = self.index.search(&stems, exact);
        self.results.insert(key, found);
    }

    fn results(&self) -> ResultSet { self.results.clone() }
}

/// Searches each query line as its own task.
///
/// The "already searched?" check and the insert are two separate critical
/// sections, so two lines with the same key can both be searched; the second
/// insert replaces the first with an equal result list.
pub struct ConcurrentQueryProcessor {
    index: Arc<ConcurrentIndex>,
    queue: Arc<WorkQueue>,
    results: Arc<Mutex<ResultSet>>,
}

impl ConcurrentQueryProcessor {
    pub fn new(index: Arc<ConcurrentIndex>, queue: Arc<WorkQueue>) -> Self {
        Self { index, queue, results: Arc::new(Mutex::new(ResultSet::new())) }
    }
}

fn search_line(index: &ConcurrentIndex, results: &Mutex<ResultSet>, line: &str, exact: bool) {
    let (stems, key) = query_key(line);
    if stems.is_empty() || results.lock().contains_key(&key) {
        return;
    }
    let found = index.search(&stems, exact);
    results.lock().insert(key, found);
}

impl QueryProcessor for ConcurrentQueryProcessor {
    fn process_file(&mut self, path: &Path, exact: bool) -> Result<()> {
        let lines = read_lines(path)?;
        let submitted = lines.into_iter().try_for_each(|line| -> Result<()> {
            let line = line.with_context(|| format!("failed to read query file {}", path.display()))?;
            let index = Arc::clone(&self.index);
            let results = Arc::clone(&self.results);
            self.queue.submit(move || {
                search_line(&index, &results, &line, exact);
                Ok(())
            })?;
            Ok(())
        });
        // lines already submitted still complete before an error is reported
        self.queue.finish();
        submitted?;
        tracing::info!(queries = self.results.lock().len(), "query file processed");
        Ok(())
    }

    fn process_line(&mut self, line: &str, exact: bool) {
        search_line(&self.index, &self.results, line, exact);
    }

    fn results(&self) -> ResultSet { self.results.lock().clone() }

    fn write_results(&self, path: &Path) -> Result<()> {
        let results = self.results.lock();
        json::write_results(&results, path)
    }
}
