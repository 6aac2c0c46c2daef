//! Pretty JSON exports: newline separated, tab indented.

use crate::index::{InvertedIndex, Locations, SearchResult};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Query key -> ranked results.
pub type ResultSet = BTreeMap<String, Vec<SearchResult>>;

pub fn write_pretty<T: Serialize + ?Sized, W: Write>(value: &T, writer: W) -> Result<()> {
    let mut ser = Serializer::with_formatter(writer, PrettyFormatter::with_indent(b"\t"));
    value.serialize(&mut ser)?;
    Ok(())
}

pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    write_pretty(value, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

pub fn save_pretty<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_pretty(value, &mut out).with_context(|| format!("failed to write {}", path.display()))?;
    out.flush()?;
    Ok(())
}

/// `{ term: { location: [positions] } }`
pub fn write_index(index: &InvertedIndex, path: &Path) -> Result<()> {
    save_pretty(index.terms(), path)
}

/// `{ location: count }`
pub fn write_counts(index: &InvertedIndex, path: &Path) -> Result<()> {
    save_pretty(index.counts(), path)
}

/// `{ query: [ { count, score, where } ] }`
pub fn write_results(results: &ResultSet, path: &Path) -> Result<()> {
    save_pretty(results, path)
}

/// Rebuilds an index from a nested-index export. Word counts are recomputed
/// from the postings.
pub fn read_index(path: &Path) -> Result<InvertedIndex> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let terms: BTreeMap<String, Locations> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("malformed index export {}", path.display()))?;
    let mut index = InvertedIndex::new();
    for (term, locations) in &terms {
        for (location, posting) in locations {
            for &position in posting {
                index.add(term, location, position);
            }
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_tab_indented() {
        let mut index = InvertedIndex::new();
        index.add_all(&["hello", "world"], "a.txt");
        let text = to_pretty_string(index.counts()).unwrap();
        assert_eq!(text, "{\n\t\"a.txt\": 2\n}");
    }
}
