//! Budget-bounded web crawler feeding a shared [`ConcurrentIndex`].
//!
//! Every page is one task on the [`WorkQueue`]. A task fetches its page,
//! records the page metadata, schedules unseen links while the frontier is
//! below budget, and merges a privately built index for the page into the
//! shared one with a single write.

pub mod fetch;
pub mod html;

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use scraper::Html;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use stemdex_core::{tokenizer, ConcurrentIndex, InvertedIndex, WorkQueue};
use time::macros::format_description;
use time::OffsetDateTime;
use url::Url;

pub use fetch::{FetchedPage, Fetcher, HttpFetcher};

/// Metadata for one fetched page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    location: String,
    title: String,
    snippet: String,
    content_length: u64,
    timestamp: String,
}

impl Page {
    pub fn location(&self) -> &str { &self.location }
    pub fn title(&self) -> &str { &self.title }
    pub fn snippet(&self) -> &str { &self.snippet }
    pub fn content_length(&self) -> u64 { self.content_length }
    pub fn timestamp(&self) -> &str { &self.timestamp }
}

/// Every URL ever scheduled, capped at `max` entries.
pub(crate) struct Frontier {
    max: usize,
    seen: Mutex<HashSet<String>>,
}

impl Frontier {
    /// A budget below 1 is raised to 1.
    pub fn new(max: usize) -> Self { Self { max: max.max(1), seen: Mutex::new(HashSet::new()) } }

    pub fn max(&self) -> usize { self.max }

    /// Schedules a seed: only an already-present URL is refused.
    fn insert_seed(&self, url: &Url) -> bool { self.seen.lock().insert(url.to_string()) }

    /// Admits unseen `links` in order until the budget is reached and
    /// returns the admitted ones.
    fn admit(&self, links: Vec<Url>) -> Vec<Url> {
        let mut seen = self.seen.lock();
        let mut admitted = Vec::new();
        for link in links {
            if seen.len() >= self.max {
                break;
            }
            if seen.insert(link.to_string()) {
                admitted.push(link);
            }
        }
        admitted
    }

    pub fn len(&self) -> usize { self.seen.lock().len() }

    pub fn contains(&self, url: &str) -> bool { self.seen.lock().contains(url) }
}

struct CrawlState {
    index: Arc<ConcurrentIndex>,
    queue: Arc<WorkQueue>,
    fetcher: Arc<dyn Fetcher>,
    frontier: Frontier,
    pages: RwLock<HashMap<String, Page>>,
}

pub struct Crawler {
    state: Arc<CrawlState>,
}

impl Crawler {
    pub fn new(index: Arc<ConcurrentIndex>, queue: Arc<WorkQueue>, fetcher: Arc<dyn Fetcher>, max: usize) -> Self {
        let state = CrawlState { index, queue, fetcher, frontier: Frontier::new(max), pages: RwLock::new(HashMap::new()) };
        Self { state: Arc::new(state) }
    }

    /// Schedules a crawl from `seed` and returns without waiting for it.
    /// Returns false when the seed was already in the frontier.
    pub fn build(&self, seed: &str) -> Result<bool> {
        let seed = Url::parse(seed.trim()).with_context(|| format!("malformed seed URL {seed}"))?;
        let seed = html::normalize(&seed);
        if !self.state.frontier.insert_seed(&seed) {
            tracing::info!(%seed, "seed already crawled");
            return Ok(false);
        }
        submit_page(&self.state, seed)?;
        Ok(true)
    }

    /// [`build`](Self::build), then waits for the whole crawl to finish.
    pub fn crawl(&self, seed: &str) -> Result<bool> {
        let scheduled = self.build(seed)?;
        self.state.queue.finish();
        tracing::info!(pages = self.page_count(), frontier = self.frontier_len(), "crawl complete");
        Ok(scheduled)
    }

    pub fn get_page(&self, location: &str) -> Option<Page> { self.state.pages.read().get(location).cloned() }

    pub fn page_count(&self) -> usize { self.state.pages.read().len() }

    pub fn frontier_len(&self) -> usize { self.state.frontier.len() }

    pub fn in_frontier(&self, url: &str) -> bool { self.state.frontier.contains(url) }

    pub fn max(&self) -> usize { self.state.frontier.max() }
}

fn submit_page(state: &Arc<CrawlState>, url: Url) -> Result<()> {
    let task_state = Arc::clone(state);
    state.queue.submit(move || crawl_page(&task_state, url))?;
    Ok(())
}

fn crawl_page(state: &Arc<CrawlState>, url: Url) -> Result<()> {
    let url = html::normalize(&url);
    let location = url.to_string();

    let Some(fetched) = state.fetcher.fetch(&url).with_context(|| format!("failed to fetch {location}"))? else {
        tracing::debug!(%location, "no HTML to index");
        return Ok(());
    };

    let page = {
        let doc = Html::parse_document(&fetched.html);
        Page {
            location: location.clone(),
            title: html::title(&doc),
            snippet: html::snippet(&doc),
            content_length: fetched.content_length,
            timestamp: timestamp(),
        }
    };
    state.pages.write().insert(location.clone(), page);

    let content = html::strip_block_elements(&fetched.html);
    for link in state.frontier.admit(html::links(&url, &content)) {
        submit_page(state, link)?;
    }

    let stems = tokenizer::list_stems(&html::plain_text(&content));
    let mut local = InvertedIndex::new();
    local.add_all(&stems, &location);
    state.index.merge(local);
    tracing::debug!(%location, words = stems.len(), "indexed page");
    Ok(())
}

fn timestamp() -> String {
    let format = format_description!("[weekday], [month repr:long] [day], [year] at [hour repr:12]:[minute] [period]");
    OffsetDateTime::now_utc().format(&format).unwrap_or_default()
}
