use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stemdex_core::{
    builder, json, ConcurrentIndex, ConcurrentQueryProcessor, InvertedIndex, QueryProcessor, SequentialQueryProcessor,
    WorkQueue, DEFAULT_THREADS,
};
use stemdex_crawler::{Crawler, HttpFetcher};
use tracing_subscriber::{fmt, EnvFilter};

const USER_AGENT: &str = "stemdex-crawler/0.1";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "indexer")]
#[command(about = "Build, crawl and query a stemmed inverted index", long_about = None)]
struct Cli {
    /// Text file or directory of .txt/.text files to index
    #[arg(long)]
    text: Option<PathBuf>,
    /// Worker threads; enables the multithreaded pipeline
    #[arg(long, num_args = 0..=1, default_missing_value = "5", allow_negative_numbers = true)]
    threads: Option<i64>,
    /// Seed URL to crawl; enables the multithreaded pipeline
    #[arg(long)]
    html: Option<String>,
    /// Maximum number of URLs the crawl may schedule
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    max: i64,
    /// File with one query per line
    #[arg(long)]
    query: Option<PathBuf>,
    /// Match whole stems only instead of prefixes
    #[arg(long, default_value_t = false)]
    exact: bool,
    /// Write per-location word counts as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "counts.json")]
    counts: Option<PathBuf>,
    /// Write the inverted index as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "index.json")]
    index: Option<PathBuf>,
    /// Write query results as JSON
    #[arg(long, num_args = 0..=1, default_missing_value = "results.json")]
    results: Option<PathBuf>,
}

impl Cli {
    fn concurrent(&self) -> bool { self.threads.is_some() || self.html.is_some() }

    fn pool_size(&self) -> usize {
        match self.threads {
            Some(n) if n >= 1 => n as usize,
            _ => DEFAULT_THREADS,
        }
    }

    fn budget(&self) -> usize { self.max.max(1) as usize }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    if cli.concurrent() {
        run_concurrent(&cli)
    } else {
        run_sequential(&cli);
        Ok(())
    }
}

/// Logs a failed step and lets the driver carry on.
fn report(step: &str, result: Result<()>) {
    if let Err(err) = result {
        tracing::error!(step, error = %format!("{err:#}"), "step failed");
    }
}

fn run_sequential(cli: &Cli) {
    let mut index = InvertedIndex::new();

    if let Some(text) = &cli.text {
        report("build", builder::build(text, &mut index));
    }

    let mut queries = SequentialQueryProcessor::new(&index);
    if let Some(query) = &cli.query {
        report("query", queries.process_file(query, cli.exact));
    }

    if let Some(path) = &cli.counts {
        report("counts", json::write_counts(&index, path));
    }
    if let Some(path) = &cli.index {
        report("index", json::write_index(&index, path));
    }
    if let Some(path) = &cli.results {
        report("results", queries.write_results(path));
    }
}

fn run_concurrent(cli: &Cli) -> Result<()> {
    let queue = Arc::new(WorkQueue::new(cli.pool_size())?);
    let index = Arc::new(ConcurrentIndex::new());
    tracing::info!(threads = queue.size(), "multithreaded pipeline");

    if let Some(text) = &cli.text {
        report("build", builder::build_concurrent(text, &index, &queue));
    }

    if let Some(seed) = &cli.html {
        report("crawl", crawl(seed, cli.budget(), &index, &queue));
    }

    let mut queries = ConcurrentQueryProcessor::new(Arc::clone(&index), Arc::clone(&queue));
    if let Some(query) = &cli.query {
        report("query", queries.process_file(query, cli.exact));
    }

    queue.shutdown();

    if let Some(path) = &cli.counts {
        report("counts", index.write_counts(path));
    }
    if let Some(path) = &cli.index {
        report("index", index.write_index(path));
    }
    if let Some(path) = &cli.results {
        report("results", queries.write_results(path));
    }
    Ok(())
}

fn crawl(seed: &str, max: usize, index: &Arc<ConcurrentIndex>, queue: &Arc<WorkQueue>) -> Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(USER_AGENT, FETCH_TIMEOUT)?);
    let crawler = Crawler::new(Arc::clone(index), Arc::clone(queue), fetcher, max);
    crawler.crawl(seed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse(args: &[&str]) -> Cli { Cli::try_parse_from(std::iter::once("indexer").chain(args.iter().copied())).unwrap() }

    #[test]
    fn no_flags_runs_sequentially() {
        let cli = parse(&[]);
        assert!(!cli.concurrent());
        assert_eq!(cli.budget(), 1);
        assert!(cli.counts.is_none() && cli.index.is_none() && cli.results.is_none());
    }

    #[test]
    fn thread_count_falls_back_to_default() {
        assert_eq!(parse(&["--threads"]).pool_size(), DEFAULT_THREADS);
        assert_eq!(parse(&["--threads", "0"]).pool_size(), DEFAULT_THREADS);
        assert_eq!(parse(&["--threads", "-3"]).pool_size(), DEFAULT_THREADS);
        assert_eq!(parse(&["--threads", "3"]).pool_size(), 3);
        assert!(parse(&["--threads", "2"]).concurrent());
    }

    #[test]
    fn crawl_seed_selects_threads_and_clamps_budget() {
        let cli = parse(&["--html", "https://example.com/", "--max", "-4"]);
        assert!(cli.concurrent());
        assert_eq!(cli.pool_size(), DEFAULT_THREADS);
        assert_eq!(cli.budget(), 1);
        assert_eq!(parse(&["--html", "https://example.com/", "--max", "50"]).budget(), 50);
    }

    #[test]
    fn exports_default_their_paths() {
        let cli = parse(&["--counts", "--index", "--results", "out/r.json"]);
        assert_eq!(cli.counts.as_deref(), Some(Path::new("counts.json")));
        assert_eq!(cli.index.as_deref(), Some(Path::new("index.json")));
        assert_eq!(cli.results.as_deref(), Some(Path::new("out/r.json")));
    }
}
