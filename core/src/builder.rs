//! Corpus ingestion from text files on disk.

use crate::concurrent::ConcurrentIndex;
use crate::index::InvertedIndex;
use crate::tokenizer;
use crate::work_queue::WorkQueue;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// `.txt` and `.text` files, case-insensitively.
pub fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("text"))
}

/// Indexes one file line by line. Positions run on across lines, starting at 1.
pub fn index_file(path: &Path, index: &mut InvertedIndex) -> Result<()> {
    let location = path.to_string_lossy();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut position = 0;
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        for stem in tokenizer::list_stems(&line) {
            position += 1;
            index.add(&stem, &location, position);
        }
    }
    tracing::debug!(path = %path.display(), words = position, "indexed file");
    Ok(())
}

/// Files to index under `root`. A root that is itself a file is returned
/// as is, whatever its extension.
pub fn text_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_file() && is_text_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Builds `index` on the calling thread. The first unreadable file aborts
/// the build.
pub fn build(root: &Path, index: &mut InvertedIndex) -> Result<()> {
    let files = text_files(root)?;
    for file in &files {
        index_file(file, index)?;
    }
    tracing::info!(files = files.len(), words = index.size(), "index build complete");
    Ok(())
}

/// Builds `index` with one task per file. Each task indexes its file into a
/// private index and merges it once; a file that cannot be read is logged
/// and skipped. Returns after every file task has completed.
pub fn build_concurrent(root: &Path, index: &Arc<ConcurrentIndex>, queue: &WorkQueue) -> Result<()> {
    let files = text_files(root)?;
    let total = files.len();
    for file in files {
        let index = Arc::clone(index);
        queue.submit(move || {
            let mut local = InvertedIndex::new();
            index_file(&file, &mut local)?;
            index.merge(local);
            Ok(())
        })?;
    }
    queue.finish();
    tracing::info!(files = total, words = index.size(), "concurrent index build complete");
    Ok(())
}
