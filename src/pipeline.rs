use std::mem;

use anyhow::Result;
use tracing::info;

use crate::fetch::Fetch;
use crate::parser::pages::{locate_pages, PageUrls};
use crate::parser::table::extract_records;
use crate::query::ChainQuery;
use crate::record::Record;

enum Stage {
    Seed,
    Locate,
    Pages(PageUrls),
    Done,
}

/// Records from the seed page, then from pages 2..=N in order.
///
/// Pull-based: a page is fetched only when the previous one is drained. The
/// first error is yielded once and the stream then ends.
pub struct RecordStream<'f, F: Fetch> {
    fetcher: &'f F,
    seed_url: String,
    stage: Stage,
    current: std::vec::IntoIter<Record>,
}

impl<'f, F: Fetch> RecordStream<'f, F> {
    pub fn new(fetcher: &'f F, seed_url: String) -> Self {
        RecordStream {
            fetcher,
            seed_url,
            stage: Stage::Seed,
            current: Vec::new().into_iter(),
        }
    }

    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    fn advance(&mut self, stage: Stage) -> Result<Option<Stage>> {
        let next = match stage {
            Stage::Seed => {
                info!("Scraping data from URL {}", self.seed_url);
                self.current = extract_records(self.fetcher, &self.seed_url)?;
                Stage::Locate
            }
            Stage::Locate => Stage::Pages(locate_pages(self.fetcher, &self.seed_url)?),
            Stage::Pages(mut urls) => match urls.next() {
                Some(url) => {
                    info!("Scraping data from URL {}", url);
                    self.current = extract_records(self.fetcher, &url)?;
                    Stage::Pages(urls)
                }
                None => return Ok(None),
            },
            Stage::Done => return Ok(None),
        };
        Ok(Some(next))
    }
}

impl<F: Fetch> Iterator for RecordStream<'_, F> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Result<Record>> {
        loop {
            if let Some(rec) = self.current.next() {
                return Some(Ok(rec));
            }
            let stage = mem::replace(&mut self.stage, Stage::Done);
            match self.advance(stage) {
                Ok(Some(next)) => self.stage = next,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Build the seed URL for `ticker` and stream every record of the result set.
pub fn scrape<'f, F: Fetch>(
    fetcher: &'f F,
    base_url: &str,
    ticker: &str,
    query: &ChainQuery,
) -> Result<RecordStream<'f, F>> {
    let seed_url = query.seed_url(base_url, ticker)?;
    Ok(RecordStream::new(fetcher, seed_url))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::StaticPages;

    const BASE: &str = "https://old.nasdaq.com";
    const SEED: &str = "https://old.nasdaq.com/symbol/aapl/option-chain?money=all";

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn paginated() -> StaticPages {
        StaticPages::default()
            .with(SEED, &fixture("paginated_page1"))
            .with(&format!("{}&page=2", SEED), &fixture("paginated_page2"))
            .with(&format!("{}&page=3", SEED), &fixture("paginated_page3"))
    }

    #[test]
    fn nothing_fetched_until_pulled() {
        let pages = paginated();
        let mut stream = scrape(&pages, BASE, "AAPL", &ChainQuery::default()).unwrap();
        assert_eq!(stream.seed_url(), SEED);
        assert!(pages.requests().is_empty());

        stream.next().unwrap().unwrap();
        assert_eq!(pages.requests(), vec![SEED.to_string()]);
    }

    #[test]
    fn pages_in_ascending_order() {
        let pages = paginated();
        let strikes: Vec<String> = scrape(&pages, BASE, "AAPL", &ChainQuery::default())
            .unwrap()
            .map(|r| r.unwrap().get("Strike").unwrap().to_string())
            .collect();
        assert_eq!(strikes, vec!["100", "105", "110", "115", "120"]);
        assert_eq!(
            pages.requests(),
            vec![
                SEED.to_string(),
                SEED.to_string(),
                format!("{}&page=2", SEED),
                format!("{}&page=3", SEED),
            ]
        );
    }

    #[test]
    fn single_page_stops_after_seed() {
        let pages = StaticPages::default().with(SEED, &fixture("single_page"));
        let records: Vec<Record> = scrape(&pages, BASE, "aapl", &ChainQuery::default())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn missing_page_ends_stream_with_error() {
        let pages = StaticPages::default()
            .with(SEED, &fixture("paginated_page1"))
            .with(&format!("{}&page=2", SEED), &fixture("paginated_page2"));
        let items: Vec<_> = scrape(&pages, BASE, "AAPL", &ChainQuery::default())
            .unwrap()
            .collect();
        assert_eq!(items.len(), 5);
        assert!(items[..4].iter().all(|r| r.is_ok()));
        assert!(items[4].is_err());
    }

    #[test]
    fn seed_failure_yields_single_error() {
        let pages = StaticPages::default();
        let mut stream = scrape(&pages, BASE, "AAPL", &ChainQuery::default()).unwrap();
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
        assert_eq!(pages.requests().len(), 1);
    }
}
