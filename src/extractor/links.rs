use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// Absolute outbound links of a document, in document order.
///
/// Each href is resolved against `base`, loses its fragment and a single
/// trailing slash. Hrefs that are blank or do not resolve are skipped.
pub fn extract_links(document: &Html, base: &Url) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter_map(|href| base.join(href).ok())
        .map(|mut absolute| {
            absolute.set_fragment(None);
            let mut link: String = absolute.into();
            if link.ends_with('/') {
                link.pop();
            }
            link
        })
        .collect()
}
