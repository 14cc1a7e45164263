use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use scraper::Html;
use tracing::debug;

use super::selector;
use crate::config::LAST_PAGE_ID;
use crate::fetch::Fetch;

static PAGE_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&page=(\d+)").unwrap());

/// Follow-on page URLs `{seed}&page=2 ..= {seed}&page=N`.
///
/// Yields strings only; the page behind each URL is fetched by whoever
/// consumes it.
#[derive(Debug, Clone)]
pub struct PageUrls {
    seed: String,
    next: u64,
    last: u64,
}

impl PageUrls {
    fn new(seed: &str, last: Option<u32>) -> Self {
        PageUrls {
            seed: seed.to_string(),
            next: 2,
            last: last.map_or(0, u64::from),
        }
    }
}

impl Iterator for PageUrls {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.next > self.last {
            return None;
        }
        let url = format!("{}&page={}", self.seed, self.next);
        self.next += 1;
        Some(url)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = (self.last + 1).saturating_sub(self.next) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for PageUrls {}

/// Fetch the seed page once and list the remaining pages of the result set.
pub fn locate_pages<F: Fetch>(fetcher: &F, seed_url: &str) -> Result<PageUrls> {
    let html = fetcher.fetch(seed_url)?;
    let last = last_page_number(&html)?;
    debug!("Last page for {}: {:?}", seed_url, last);
    Ok(PageUrls::new(seed_url, last))
}

/// Page number in the "last page" control's link, if the page has one.
/// A missing control, missing href, or unparsable number means no pagination.
pub fn last_page_number(html: &str) -> Result<Option<u32>> {
    let doc = Html::parse_document(html);
    let sel = selector(&format!("[id=\"{}\"]", LAST_PAGE_ID))?;

    let last = doc
        .select(&sel)
        .filter_map(|el| el.value().attr("href"))
        .find_map(page_param);
    Ok(last)
}

fn page_param(href: &str) -> Option<u32> {
    PAGE_PARAM_RE.captures(href)?.get(1)?.as_str().parse().ok()
}
