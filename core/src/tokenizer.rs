use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_ALPHA: Regex = Regex::new(r"[^\p{Alphabetic}\s]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Decomposes accents away, drops everything that is not a letter or
/// whitespace, and lowercases the rest.
pub fn clean(text: &str) -> String {
    let decomposed = text.nfd().collect::<String>();
    NON_ALPHA.replace_all(&decomposed, "").to_lowercase()
}

/// Splits cleaned text into words.
pub fn parse(text: &str) -> Vec<String> {
    clean(text).split_whitespace().map(str::to_string).collect()
}

pub fn stem(word: &str) -> String { STEMMER.stem(word).into_owned() }

/// Stems every word of `text` in order, keeping duplicates.
pub fn list_stems(text: &str) -> Vec<String> {
    parse(text).iter().map(|w| stem(w)).collect()
}

/// Sorted set of the distinct stems of `text`.
pub fn unique_stems(text: &str) -> BTreeSet<String> {
    parse(text).iter().map(|w| stem(w)).collect()
}
