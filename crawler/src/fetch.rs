use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::{header, redirect};
use std::time::Duration;
use url::Url;

pub const MAX_REDIRECTS: usize = 3;

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    pub content_length: u64,
}

/// Source of raw HTML for the crawler.
pub trait Fetcher: Send + Sync {
    /// `Ok(None)` when the URL answered with something other than a
    /// successful HTML response.
    fn fetch(&self, url: &Url) -> Result<Option<FetchedPage>>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Option<FetchedPage>> {
        let resp = self.client.get(url.clone()).send().with_context(|| format!("request to {url} failed"))?;
        if !resp.status().is_success() {
            tracing::debug!(%url, status = %resp.status(), "unsuccessful response");
            return Ok(None);
        }
        let is_html = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/html"));
        if !is_html {
            tracing::debug!(%url, "not an HTML response");
            return Ok(None);
        }
        let declared = resp.content_length();
        let html = resp.text().with_context(|| format!("failed to read body of {url}"))?;
        let content_length = declared.unwrap_or(html.len() as u64);
        Ok(Some(FetchedPage { html, content_length }))
    }
}
