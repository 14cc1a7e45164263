pub mod pages;
pub mod table;

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Selector};

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {:?}: {}", css, e))
}

/// Direct element children with the given tag name.
fn child_elements<'a>(el: ElementRef<'a>, name: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |c| c.value().name() == name)
}

/// Text nodes directly under `el`, ignoring nested elements.
fn own_text(el: ElementRef) -> String {
    el.children()
        .filter_map(|n| n.value().as_text().map(|t| t.to_string()))
        .collect::<String>()
        .trim()
        .to_string()
}

/// All descendant text, concatenated and trimmed.
fn deep_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
