use anyhow::Result;
use scraper::{ElementRef, Html};
use tracing::debug;

use super::{child_elements, deep_text, own_text, selector};
use crate::config::TABLE_CONTAINER_CLASS;
use crate::fetch::Fetch;
use crate::record::Record;

/// Fetch one page and return its records in document order.
pub fn extract_records<F: Fetch>(fetcher: &F, page_url: &str) -> Result<std::vec::IntoIter<Record>> {
    let html = fetcher.fetch(page_url)?;
    let records = parse_records(&html)?;
    debug!("{} records on {}", records.len(), page_url);
    Ok(records.into_iter())
}

/// Headers come from the options-chain container. Rows are every `<tr>` in
/// the document whose `<td>` count equals the header count; anything else
/// (sub-headers, spacers, layout rows) is dropped.
pub fn parse_records(html: &str) -> Result<Vec<Record>> {
    let doc = Html::parse_document(html);

    let container_sel = selector(&format!("div[class=\"{}\"]", TABLE_CONTAINER_CLASS))?;
    let Some(container) = doc.select(&container_sel).next() else {
        return Ok(Vec::new());
    };

    let headers = header_names(container);
    // Stricter than a bare arity match, which would turn every td-less row
    // into an empty record when no header cells exist.
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    // Document-wide on purpose: the arity check is what keeps foreign rows out.
    let row_sel = selector("tr")?;
    let records = doc
        .select(&row_sel)
        .map(|tr| child_elements(tr, "td").map(deep_text).collect::<Vec<_>>())
        .filter(|cells| cells.len() == headers.len())
        .map(|cells| Record::from_row(&headers, cells))
        .collect();
    Ok(records)
}

/// `table > thead > tr > th` directly under the container. A header cell
/// wrapping a link is named by the link.
fn header_names(container: ElementRef) -> Vec<String> {
    child_elements(container, "table")
        .flat_map(|t| child_elements(t, "thead"))
        .flat_map(|h| child_elements(h, "tr"))
        .flat_map(|r| child_elements(r, "th"))
        .map(|th| match child_elements(th, "a").next() {
            Some(a) => own_text(a),
            None => own_text(th),
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::StaticPages;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    #[test]
    fn single_page_fixture() {
        let records = parse_records(&fixture("single_page")).unwrap();
        assert_eq!(records.len(), 3);
        for r in &records {
            assert_eq!(r.keys().collect::<Vec<_>>(), vec!["Strike", "Bid"]);
        }
        assert_eq!(records[0].get("Strike"), Some("100.00"));
        assert_eq!(records[0].get("Bid"), Some("12.35"));
        assert_eq!(records[2].get("Strike"), Some("110.00"));
    }

    #[test]
    fn link_header_uses_link_text() {
        let html = r#"
            <div class="OptionsChain-chart borderAll thin">
              <table>
                <thead><tr><th><a href="?sort=exp">Calls</a></th><th> Last </th><th>Root</th></tr></thead>
                <tr><td><a href="/x">Jan 17</a></td><td>1.05</td><td> AAPL </td></tr>
              </table>
            </div>"#;
        let records = parse_records(html).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].keys().collect::<Vec<_>>(), vec!["Calls", "Last", "Root"]);
        assert_eq!(records[0].get("Calls"), Some("Jan 17"));
        assert_eq!(records[0].get("Root"), Some("AAPL"));
    }

    #[test]
    fn cell_text_concatenates_descendants() {
        let html = r#"
            <div class="OptionsChain-chart borderAll thin">
              <table><thead><tr><th>A</th></tr></thead>
                <tr><td>
                    <span>12</span>.<b>5</b>
                </td></tr>
              </table>
            </div>"#;
        let records = parse_records(html).unwrap();
        assert_eq!(records[0].get("A"), Some("12.5"));
    }

    #[test]
    fn mismatched_rows_are_dropped() {
        let html = r#"
            <div class="OptionsChain-chart borderAll thin">
              <table>
                <thead><tr><th>Strike</th><th>Bid</th></tr></thead>
                <tr><td colspan="2">Expiring Jan 17</td></tr>
                <tr><td>100</td><td>1.1</td></tr>
                <tr><td>105</td><td>0.9</td><td>extra</td></tr>
              </table>
            </div>"#;
        let records = parse_records(html).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Strike"), Some("100"));
    }

    #[test]
    fn rows_outside_container_with_matching_arity_are_kept() {
        let html = r#"
            <table><tr><td>nav</td><td>links</td></tr></table>
            <div class="OptionsChain-chart borderAll thin">
              <table>
                <thead><tr><th>Strike</th><th>Bid</th></tr></thead>
                <tr><td>100</td><td>1.1</td></tr>
              </table>
            </div>"#;
        let records = parse_records(html).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Strike"), Some("nav"));
    }

    #[test]
    fn no_container_no_records() {
        let html = "<table><tr><td>1</td><td>2</td></tr></table>";
        assert!(parse_records(html).unwrap().is_empty());
    }

    #[test]
    fn class_must_match_exactly() {
        let html = r#"
            <div class="OptionsChain-chart borderAll">
              <table><thead><tr><th>A</th></tr></thead><tr><td>1</td></tr></table>
            </div>"#;
        assert!(parse_records(html).unwrap().is_empty());
    }

    #[test]
    fn headerless_container_skips_empty_rows() {
        let html = r#"
            <div class="OptionsChain-chart borderAll thin">
              <table><thead><tr></tr></thead>
                <tr></tr>
                <tr><th>not a cell</th></tr>
              </table>
            </div>"#;
        assert!(parse_records(html).unwrap().is_empty());
    }

    #[test]
    fn two_sided_chain_collapses_repeated_headers() {
        let records = parse_records(&fixture("two_sided")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].keys().collect::<Vec<_>>(),
            vec!["Calls", "Last", "Chg", "Bid", "Ask", "Vol", "Open Int", "Root", "Strike", "Puts"]
        );
        // Puts-side cells come later in the row and win.
        assert_eq!(records[0].get("Last"), Some("0.31"));
        assert_eq!(records[0].get("Bid"), Some("0.30"));
        assert_eq!(records[0].get("Open Int"), Some("1930"));
        assert_eq!(records[1].get("Strike"), Some("105"));
        assert_eq!(records[1].get("Chg"), Some("0.04"));
    }

    #[test]
    fn extract_fetches_once() {
        let url = "http://test/page";
        let pages = StaticPages::default().with(url, &fixture("single_page"));
        let records: Vec<_> = extract_records(&pages, url).unwrap().collect();
        assert_eq!(records.len(), 3);
        assert_eq!(pages.requests(), vec![url.to_string()]);
    }
}
