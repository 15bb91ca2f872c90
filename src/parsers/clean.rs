use crate::parsers::{ExtractError, selector};
use crate::patterns::{CONTENT_CLASS, NON_CONTENT_TAGS};
use scraper::{ElementRef, Html};

/// Removes non-content subtrees from `html` and returns the serialized
/// main-content region.
pub fn clean(html: &str) -> Result<String, ExtractError> {
    let document = Html::parse_document(html);
    clean_document(&document)
}

/// Same as [`clean`] for an already parsed document.
///
/// Works on a copy, so `document` stays intact for the structured extractor.
pub fn clean_document(document: &Html) -> Result<String, ExtractError> {
    let mut copy = document.clone();
    strip_non_content(&mut copy)?;

    let root = main_content_root(&copy)?;
    Ok(match root {
        Some(element) => element.html(),
        None => copy.html(),
    })
}

/// Detaches script, style, nav, footer, header and aside subtrees
fn strip_non_content(document: &mut Html) -> Result<usize, ExtractError> {
    let unwanted = selector(&NON_CONTENT_TAGS.join(", "))?;
    let ids: Vec<_> = document.select(&unwanted).map(|e| e.id()).collect();

    for id in &ids {
        if let Some(mut node) = document.tree.get_mut(*id) {
            node.detach();
        }
    }

    ::log::trace!("Cleaner removed {} non-content elements", ids.len());
    Ok(ids.len())
}

/// Picks the content root: `<main>`, then `<article>`, then the first
/// element with a content-like class. `None` means the whole document.
fn main_content_root(document: &Html) -> Result<Option<ElementRef<'_>>, ExtractError> {
    for tag in ["main", "article"] {
        let sel = selector(tag)?;
        if let Some(element) = document.select(&sel).next() {
            ::log::debug!("Main content root: <{}>", tag);
            return Ok(Some(element));
        }
    }

    let with_class = selector("[class]")?;
    let by_class = document.select(&with_class).find(|element| {
        element
            .value()
            .attr("class")
            .is_some_and(|class| CONTENT_CLASS.is_match(class))
    });

    if let Some(element) = by_class {
        ::log::debug!(
            "Main content root: <{}> by class '{}'",
            element.value().name(),
            element.value().attr("class").unwrap_or_default()
        );
    } else {
        ::log::debug!("Main content root: whole document");
    }
    Ok(by_class)
}
