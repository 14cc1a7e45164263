use anyhow::{Context, Result};
use tracing::debug;

use crate::error::ScrapeError;

/// Source of raw page HTML. One call is one GET.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain blocking GET: no custom headers, no retry, default client timeouts.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpFetcher { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        response
            .text()
            .with_context(|| format!("Failed to read body of {}", url))
    }
}
