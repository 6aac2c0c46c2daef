use serde::ser::{Error as _, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

pub type Position = usize;
pub type Posting = BTreeSet<Position>;
pub type Locations = BTreeMap<String, Posting>;

/// Term -> location -> positions, plus the number of tokens indexed per location.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvertedIndex {
    terms: BTreeMap<String, Locations>,
    counts: BTreeMap<String, usize>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Records `term` at `position` of `location`. Returns false when the
    /// triple was already present, in which case the word count is untouched.
    pub fn add(&mut self, term: &str, location: &str, position: Position) -> bool {
        let inserted = self
            .terms
            .entry(term.to_string())
            .or_default()
            .entry(location.to_string())
            .or_default()
            .insert(position);
        if inserted {
            *self.counts.entry(location.to_string()).or_insert(0) += 1;
        }
        inserted
    }

    /// Adds `terms` at positions `1..=terms.len()` of `location`.
    pub fn add_all<S: AsRef<str>>(&mut self, terms: &[S], location: &str) {
        for (i, term) in terms.iter().enumerate() {
            self.add(term.as_ref(), location, i + 1);
        }
    }

    /// Unions `other` into this index.
    ///
    /// Each location's word count grows by the number of positions the union
    /// actually inserted, so merging indexes built from disjoint locations is
    /// the same as summing their counts and overlapping postings are never
    /// counted twice.
    pub fn merge(&mut self, other: InvertedIndex) {
        let mut added: BTreeMap<String, usize> = BTreeMap::new();
        for (term, locations) in other.terms {
            match self.terms.entry(term) {
                Entry::Vacant(slot) => {
                    for (location, posting) in &locations {
                        *added.entry(location.clone()).or_insert(0) += posting.len();
                    }
                    slot.insert(locations);
                }
                Entry::Occupied(mut slot) => {
                    let mine = slot.get_mut();
                    for (location, posting) in locations {
                        let fresh = match mine.entry(location.clone()) {
                            Entry::Vacant(slot) => {
                                let n = posting.len();
                                slot.insert(posting);
                                n
                            }
                            Entry::Occupied(mut slot) => {
                                let existing = slot.get_mut();
                                posting.into_iter().filter(|&p| existing.insert(p)).count()
                            }
                        };
                        *added.entry(location).or_insert(0) += fresh;
                    }
                }
            }
        }
        for (location, fresh) in added {
            if fresh > 0 {
                *self.counts.entry(location).or_insert(0) += fresh;
            }
        }
    }

    pub fn exact_search<I, S>(&self, stems: I) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tally = Tally::default();
        for stem in stems {
            if let Some(locations) = self.terms.get(stem.as_ref()) {
                tally.add(locations);
            }
        }
        tally.finish(&self.counts)
    }

    /// Treats every stem as a prefix and matches the contiguous run of terms
    /// starting with it.
    pub fn partial_search<I, S>(&self, stems: I) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tally = Tally::default();
        for stem in stems {
            let prefix = stem.as_ref();
            for (_, locations) in prefixed(&self.terms, prefix) {
                tally.add(locations);
            }
        }
        tally.finish(&self.counts)
    }

    pub fn search<I, S>(&self, stems: I, exact: bool) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if exact { self.exact_search(stems) } else { self.partial_search(stems) }
    }

    /// Indexed locations starting with `prefix`, ascending.
    pub fn partial_location_search(&self, prefix: &str) -> Vec<String> {
        prefixed(&self.counts, prefix).map(|(location, _)| location.clone()).collect()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> + '_ { self.terms.keys().map(String::as_str) }

    pub fn locations(&self, term: &str) -> impl Iterator<Item = &str> + '_ {
        self.terms.get(term).into_iter().flat_map(|l| l.keys().map(String::as_str))
    }

    pub fn positions(&self, term: &str, location: &str) -> impl Iterator<Item = Position> + '_ {
        self.terms
            .get(term)
            .and_then(|l| l.get(location))
            .into_iter()
            .flat_map(|p| p.iter().copied())
    }

    pub fn contains_word(&self, term: &str) -> bool { self.terms.contains_key(term) }

    pub fn contains_location(&self, term: &str, location: &str) -> bool {
        self.terms.get(term).is_some_and(|l| l.contains_key(location))
    }

    pub fn contains_position(&self, term: &str, location: &str, position: Position) -> bool {
        self.terms.get(term).and_then(|l| l.get(location)).is_some_and(|p| p.contains(&position))
    }

    pub fn contains_path(&self, location: &str) -> bool { self.counts.contains_key(location) }

    pub fn word_count(&self, location: &str) -> Option<usize> { self.counts.get(location).copied() }

    /// Number of distinct terms.
    pub fn size(&self) -> usize { self.terms.len() }

    /// Number of locations holding `term`.
    pub fn size_of(&self, term: &str) -> usize { self.terms.get(term).map_or(0, BTreeMap::len) }

    /// Number of positions of `term` at `location`.
    pub fn size_at(&self, term: &str, location: &str) -> usize {
        self.terms.get(term).and_then(|l| l.get(location)).map_or(0, BTreeSet::len)
    }

    pub fn num_locations(&self) -> usize { self.counts.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn terms(&self) -> &BTreeMap<String, Locations> { &self.terms }

    pub fn counts(&self) -> &BTreeMap<String, usize> { &self.counts }
}

/// Keys of `map` starting with `prefix`, in order. Relies on the sorted
/// keyspace: the scan stops at the first key outside the prefix.
fn prefixed<'m: 'p, 'p, V>(
    map: &'m BTreeMap<String, V>,
    prefix: &'p str,
) -> impl Iterator<Item = (&'m String, &'m V)> + 'p {
    map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(move |(key, _)| key.starts_with(prefix))
}

/// Running match totals per location for one search call.
#[derive(Default)]
struct Tally<'a> {
    matches: BTreeMap<&'a str, usize>,
}

impl<'a> Tally<'a> {
    fn add(&mut self, locations: &'a Locations) {
        for (location, posting) in locations {
            *self.matches.entry(location.as_str()).or_insert(0) += posting.len();
        }
    }

    fn finish(self, counts: &BTreeMap<String, usize>) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .matches
            .into_iter()
            .map(|(location, matches)| {
                let word_count = counts.get(location).copied().unwrap_or(matches).max(1);
                SearchResult {
                    location: location.to_string(),
                    matches,
                    word_count,
                    score: matches as f64 / word_count as f64,
                }
            })
            .collect();
        results.sort();
        results
    }
}

/// One location's score for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    location: String,
    matches: usize,
    word_count: usize,
    score: f64,
}

impl SearchResult {
    pub fn location(&self) -> &str { &self.location }
    pub fn matches(&self) -> usize { self.matches }
    pub fn word_count(&self) -> usize { self.word_count }
    pub fn score(&self) -> f64 { self.score }
}

impl Eq for SearchResult {}

/// Score descending, then word count descending, then location ascending
/// ignoring case, with a case-sensitive comparison breaking the last ties.
impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.word_count.cmp(&self.word_count))
            .then_with(|| {
                let lhs = self.location.chars().flat_map(char::to_lowercase);
                let rhs = other.location.chars().flat_map(char::to_lowercase);
                lhs.cmp(rhs)
            })
            .then_with(|| self.location.cmp(&other.location))
    }
}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let score = RawValue::from_string(format!("{:.8}", self.score)).map_err(S::Error::custom)?;
        let mut record = serializer.serialize_struct("SearchResult", 3)?;
        record.serialize_field("count", &self.matches)?;
        record.serialize_field("score", &score)?;
        record.serialize_field("where", &self.location)?;
        record.end()
    }
}
