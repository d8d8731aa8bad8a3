use scraper::{Html, Selector};
use tracing::warn;

use super::{Field, FieldSource};
use crate::config::Selectors;

/// A parsed page read through one selector set.
pub struct Page<'a> {
    doc: &'a Html,
    selectors: &'a Selectors,
}

impl<'a> Page<'a> {
    pub fn new(doc: &'a Html, selectors: &'a Selectors) -> Self {
        Self { doc, selectors }
    }
}

impl FieldSource for Page<'_> {
    fn candidates(&self, field: Field) -> Vec<String> {
        select_texts(self.doc, self.selectors.get(field))
    }
}

/// Trimmed text of the first element matched by each selector, in selector
/// order. Selectors that match nothing or only whitespace are skipped.
pub fn select_texts(doc: &Html, selectors: &[String]) -> Vec<String> {
    let mut texts = Vec::new();
    for raw in selectors {
        let selector = match Selector::parse(raw) {
            Ok(x) => x,
            Err(err) => {
                warn!(selector = raw.as_str(), "invalid selector: {err:?}");
                continue;
            }
        };

        if let Some(element) = doc.select(&selector).next() {
            let text = element.text().collect::<String>();
            let text = text.trim();
            if !text.is_empty() {
                texts.push(text.to_string());
            }
        }
    }
    texts
}
