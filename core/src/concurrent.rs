use crate::index::{InvertedIndex, Position, SearchResult};
use crate::json;
use crate::lock::Guarded;
use anyhow::Result;
use std::path::Path;

/// [`InvertedIndex`] shared between threads.
///
/// Mutations hold the write side of the lock for the whole call; lookups,
/// searches and exports hold the read side. Accessors return owned data so
/// nothing borrowed escapes the lock.
pub struct ConcurrentIndex {
    inner: Guarded<InvertedIndex>,
}

impl Default for ConcurrentIndex {
    fn default() -> Self { Self::new() }
}

impl From<InvertedIndex> for ConcurrentIndex {
    fn from(index: InvertedIndex) -> Self { Self { inner: Guarded::new(index) } }
}

impl ConcurrentIndex {
    pub fn new() -> Self { Self::from(InvertedIndex::new()) }

    pub fn add(&self, term: &str, location: &str, position: Position) -> bool {
        self.inner.write(|index| index.add(term, location, position))
    }

    pub fn add_all<S: AsRef<str>>(&self, terms: &[S], location: &str) {
        self.inner.write(|index| index.add_all(terms, location))
    }

    /// Folds a privately built index in with a single write-lock acquisition.
    pub fn merge(&self, other: InvertedIndex) {
        self.inner.write(|index| index.merge(other))
    }

    pub fn exact_search<I, S>(&self, stems: I) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner.read(|index| index.exact_search(stems))
    }

    pub fn partial_search<I, S>(&self, stems: I) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner.read(|index| index.partial_search(stems))
    }

    pub fn search<I, S>(&self, stems: I, exact: bool) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner.read(|index| index.search(stems, exact))
    }

    pub fn partial_location_search(&self, prefix: &str) -> Vec<String> {
        self.inner.read(|index| index.partial_location_search(prefix))
    }

    pub fn words(&self) -> Vec<String> {
        self.inner.read(|index| index.words().map(str::to_string).collect())
    }

    pub fn locations(&self, term: &str) -> Vec<String> {
        self.inner.read(|index| index.locations(term).map(str::to_string).collect())
    }

    pub fn positions(&self, term: &str, location: &str) -> Vec<Position> {
        self.inner.read(|index| index.positions(term, location).collect())
    }

    pub fn contains_word(&self, term: &str) -> bool {
        self.inner.read(|index| index.contains_word(term))
    }

    pub fn contains_location(&self, term: &str, location: &str) -> bool {
        self.inner.read(|index| index.contains_location(term, location))
    }

    pub fn contains_position(&self, term: &str, location: &str, position: Position) -> bool {
        self.inner.read(|index| index.contains_position(term, location, position))
    }

    pub fn contains_path(&self, location: &str) -> bool {
        self.inner.read(|index| index.contains_path(location))
    }

    pub fn word_count(&self, location: &str) -> Option<usize> {
        self.inner.read(|index| index.word_count(location))
    }

    pub fn size(&self) -> usize { self.inner.read(InvertedIndex::size) }

    pub fn size_of(&self, term: &str) -> usize { self.inner.read(|index| index.size_of(term)) }

    pub fn size_at(&self, term: &str, location: &str) -> usize {
        self.inner.read(|index| index.size_at(term, location))
    }

    pub fn num_locations(&self) -> usize { self.inner.read(InvertedIndex::num_locations) }

    pub fn is_empty(&self) -> bool { self.inner.read(InvertedIndex::is_empty) }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> InvertedIndex { self.inner.read(InvertedIndex::clone) }

    pub fn write_index(&self, path: &Path) -> Result<()> {
        self.inner.read(|index| json::write_index(index, path))
    }

    pub fn write_counts(&self, path: &Path) -> Result<()> {
        self.inner.read(|index| json::write_counts(index, path))
    }

    pub fn into_inner(self) -> InvertedIndex { self.inner.into_inner() }
}
