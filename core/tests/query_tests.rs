use std::fs;
use std::sync::Arc;
use stemdex_core::query::query_key;
use stemdex_core::{ConcurrentIndex, ConcurrentQueryProcessor, InvertedIndex, QueryProcessor, SequentialQueryProcessor, WorkQueue};
use tempfile::tempdir;

fn sample_index() -> InvertedIndex {
    let mut index = InvertedIndex::new();
    index.add_all(&["cat", "dog", "dog", "fish"], "pets.txt");
    index.add_all(&["cat", "lion", "tiger"], "zoo.txt");
    index.add_all(&["catalog", "dog"], "shop.txt");
    index
}

#[test]
fn keys_are_sorted_distinct_stems() {
    assert_eq!(query_key("Dogs  cats DOG").1, "cat dog");
    assert_eq!(query_key("Cats Dogs"), query_key("dogs cats"));
    assert!(query_key("  123 ").0.is_empty());
}

#[test]
fn equivalent_lines_produce_one_entry() {
    let index = sample_index();
    let mut processor = SequentialQueryProcessor::new(&index);
    processor.process_line("Cats Dogs", true);
    processor.process_line("dogs cats", true);
    processor.process_line("   ", true);
    let results = processor.results();
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["cat dog"]);
    assert_eq!(results["cat dog"].len(), 3);
}

#[test]
fn partial_queries_match_prefixes() {
    let index = sample_index();
    let mut processor = SequentialQueryProcessor::new(&index);
    processor.process_line("cat", false);
    processor.process_line("lion", true);
    let results = processor.results();
    let wheres: Vec<&str> = results["cat"].iter().map(|r| r.location()).collect();
    // shop.txt 1/2, pets.txt 1/4 vs zoo.txt 1/3
    assert_eq!(wheres, vec!["shop.txt", "zoo.txt", "pets.txt"]);
    assert_eq!(results["lion"].len(), 1);
}

#[test]
fn sequential_and_concurrent_processors_agree() {
    let dir = tempdir().unwrap();
    let queries = dir.path().join("queries.txt");
    fs::write(&queries, "cat\nDogs cats\n\ndogs CATS\nfish tiger\nunknown\ncat\n").unwrap();

    let index = sample_index();
    let mut sequential = SequentialQueryProcessor::new(&index);
    sequential.process_file(&queries, true).unwrap();

    let shared = Arc::new(ConcurrentIndex::from(sample_index()));
    let queue = Arc::new(WorkQueue::new(4).unwrap());
    let mut concurrent = ConcurrentQueryProcessor::new(shared, Arc::clone(&queue));
    concurrent.process_file(&queries, true).unwrap();

    assert_eq!(sequential.results(), concurrent.results());
    let results = concurrent.results();
    assert_eq!(results.len(), 4);
    assert!(results["unknown"].is_empty());
}

#[test]
fn results_export_format() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("results.json");
    let mut index = InvertedIndex::new();
    index.add_all(&["cat", "dog", "dog"], "pets.txt");
    let mut processor = SequentialQueryProcessor::new(&index);
    processor.process_line("dog", true);
    processor.write_results(&out).unwrap();

    let expected = "{\n\t\"dog\": [\n\t\t{\n\t\t\t\"count\": 2,\n\t\t\t\"score\": 0.66666667,\n\t\t\t\"where\": \"pets.txt\"\n\t\t}\n\t]\n}";
    assert_eq!(fs::read_to_string(&out).unwrap(), expected);
}

#[test]
fn missing_query_file_is_an_error() {
    let index = InvertedIndex::new();
    let mut processor = SequentialQueryProcessor::new(&index);
    let dir = tempdir().unwrap();
    assert!(processor.process_file(&dir.path().join("none.txt"), false).is_err());
}
