use stemdex_core::{ConcurrentIndex, InvertedIndex, SearchResult};

fn locations(results: &[SearchResult]) -> Vec<&str> {
    results.iter().map(SearchResult::location).collect()
}

#[test]
fn repeated_triples_count_once() {
    let mut index = InvertedIndex::new();
    assert!(index.add("dog", "a.txt", 1));
    assert!(!index.add("dog", "a.txt", 1));
    assert!(!index.add("dog", "a.txt", 1));
    assert!(index.add("dog", "a.txt", 2));
    assert!(index.add("cat", "a.txt", 1));
    assert_eq!(index.word_count("a.txt"), Some(3));
    assert_eq!(index.size_at("dog", "a.txt"), 2);
}

#[test]
fn exact_search_scores_every_location_of_the_term() {
    let mut index = InvertedIndex::new();
    index.add_all(&["dog", "dog", "cat"], "one.txt");
    index.add_all(&["dog", "bird", "bird", "bird"], "two.txt");
    index.add_all(&["cat"], "three.txt");

    let results = index.exact_search(["dog"]);
    assert_eq!(locations(&results), vec!["one.txt", "two.txt"]);
    assert_eq!(results[0].matches(), 2);
    assert!((results[0].score() - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(results[1].matches(), 1);
    assert!((results[1].score() - 0.25).abs() < 1e-12);
}

#[test]
fn exact_search_ignores_unknown_stems() {
    let mut index = InvertedIndex::new();
    index.add_all(&["dog"], "a.txt");
    assert!(index.exact_search(["zebra"]).is_empty());
    assert!(index.exact_search(Vec::<String>::new()).is_empty());
}

#[test]
fn partial_search_follows_the_prefix_run_only() {
    let mut index = InvertedIndex::new();
    index.add_all(&["computer", "company", "dog"], "shared.txt");
    index.add_all(&["company"], "solo.txt");
    index.add_all(&["dog", "dog"], "dogs.txt");

    let results = index.partial_search(["comp"]);
    assert_eq!(locations(&results), vec!["solo.txt", "shared.txt"]);
    assert_eq!(results[1].matches(), 2);
    assert!(results.iter().all(|r| r.location() != "dogs.txt"));
    assert_eq!(index.search(["comp"], false), results);
    assert!(index.search(["comp"], true).is_empty());
}

#[test]
fn partial_location_search_is_prefix_ordered() {
    let mut index = InvertedIndex::new();
    for location in ["https://b.com/x", "https://a.com/2", "https://a.com/1", "file.txt"] {
        index.add("word", location, 1);
    }
    assert_eq!(index.partial_location_search("https://a"), vec!["https://a.com/1", "https://a.com/2"]);
    assert!(index.partial_location_search("ftp").is_empty());
}

#[test]
fn merge_of_disjoint_locations_matches_direct_adds() {
    let first = ["apple", "banana", "apple"];
    let second = ["banana", "cherry"];

    let mut direct = InvertedIndex::new();
    direct.add_all(&first, "first.txt");
    direct.add_all(&second, "second.txt");

    let shared = ConcurrentIndex::new();
    for (words, location) in [(&first[..], "first.txt"), (&second[..], "second.txt")] {
        let mut local = InvertedIndex::new();
        local.add_all(words, location);
        shared.merge(local);
    }

    assert_eq!(shared.snapshot(), direct);
    assert_eq!(shared.exact_search(["banana"]), direct.exact_search(["banana"]));
    assert_eq!(shared.partial_search(["a", "c"]), direct.partial_search(["a", "c"]));
}

#[test]
fn merge_never_counts_an_overlapping_position_twice() {
    let mut left = InvertedIndex::new();
    left.add_all(&["x", "y"], "same.txt");
    let mut right = InvertedIndex::new();
    right.add_all(&["x", "z", "w"], "same.txt");

    left.merge(right);
    // position 1 of "x" is shared; "z"@2 and "w"@3 are new
    assert_eq!(left.word_count("same.txt"), Some(4));
    assert_eq!(left.positions("x", "same.txt").collect::<Vec<_>>(), vec![1]);
}

#[test]
fn lookups_on_missing_data_are_empty() {
    let index = InvertedIndex::new();
    assert_eq!(index.locations("nope").count(), 0);
    assert_eq!(index.positions("nope", "where").count(), 0);
    assert!(!index.contains_word("nope"));
    assert!(!index.contains_location("nope", "where"));
    assert!(!index.contains_position("nope", "where", 1));
    assert_eq!(index.word_count("where"), None);
    assert_eq!(index.size(), 0);
    assert_eq!(index.size_of("nope"), 0);
}
