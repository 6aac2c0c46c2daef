use std::fs;
use std::path::Path;
use std::sync::Arc;
use stemdex_core::builder::{build, build_concurrent, index_file, is_text_file, text_files};
use stemdex_core::{ConcurrentIndex, InvertedIndex, WorkQueue};
use tempfile::tempdir;

fn write_corpus(root: &Path) {
    fs::create_dir_all(root.join("nested/deeper")).unwrap();
    fs::write(root.join("animals.txt"), "The quick brown fox\njumps over the lazy dog.\n").unwrap();
    fs::write(root.join("nested/birds.TEXT"), "Birds fly; birds sing.").unwrap();
    fs::write(root.join("nested/deeper/empty.txt"), "").unwrap();
    fs::write(root.join("nested/ignored.md"), "foxes are not indexed here").unwrap();
}

#[test]
fn text_file_detection() {
    assert!(is_text_file(Path::new("a/b.txt")));
    assert!(is_text_file(Path::new("UPPER.TXT")));
    assert!(is_text_file(Path::new("x.Text")));
    assert!(!is_text_file(Path::new("notes.md")));
    assert!(!is_text_file(Path::new("txt")));
}

#[test]
fn walk_finds_only_text_files() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let files = text_files(dir.path()).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| is_text_file(f)));
}

#[test]
fn positions_continue_across_lines() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lines.txt");
    fs::write(&path, "one two\n\nthree\n").unwrap();

    let mut index = InvertedIndex::new();
    index_file(&path, &mut index).unwrap();
    let location = path.to_string_lossy();
    assert_eq!(index.word_count(&location), Some(3));
    assert!(index.contains_position("three", &location, 3));
}

#[test]
fn sequential_and_concurrent_builds_agree() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());

    let mut sequential = InvertedIndex::new();
    build(dir.path(), &mut sequential).unwrap();

    let shared = Arc::new(ConcurrentIndex::new());
    let queue = WorkQueue::new(4).unwrap();
    build_concurrent(dir.path(), &shared, &queue).unwrap();

    assert_eq!(shared.snapshot(), sequential);
    assert!(sequential.contains_word("bird"));
    assert!(!sequential.contains_word("foxes"));
    assert_eq!(sequential.num_locations(), 2);
}

#[test]
fn single_file_root_is_indexed_whatever_its_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, "markdown words").unwrap();
    let mut index = InvertedIndex::new();
    build(&path, &mut index).unwrap();
    assert_eq!(index.word_count(&path.to_string_lossy()), Some(2));
}

#[test]
fn sequential_build_fails_fast_on_unreadable_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("good.txt"), "fine words").unwrap();
    // invalid UTF-8 cannot be read as lines
    fs::write(dir.path().join("zz-bad.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

    let mut index = InvertedIndex::new();
    let err = build(dir.path(), &mut index).unwrap_err();
    assert!(format!("{err:#}").contains("zz-bad.txt"));
}

#[test]
fn concurrent_build_skips_unreadable_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("good.txt"), "fine words").unwrap();
    fs::write(dir.path().join("zz-bad.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

    let shared = Arc::new(ConcurrentIndex::new());
    let queue = WorkQueue::new(2).unwrap();
    build_concurrent(dir.path(), &shared, &queue).unwrap();
    assert_eq!(shared.num_locations(), 1);
    assert!(shared.contains_word("fine"));
}

#[test]
fn missing_root_is_an_error() {
    let dir = tempdir().unwrap();
    let mut index = InvertedIndex::new();
    assert!(build(&dir.path().join("absent.txt"), &mut index).is_err());
}
