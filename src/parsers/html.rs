use crate::parsers::text::{normalize_lines, normalize_whitespace_in_segment};
use crate::parsers::{ExtractError, selector};
use crate::results::Link;
use scraper::{ElementRef, Html, Node};
use url::Url;

/// Elements whose text never shows up on screen
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Elements that start a new line in rendered text
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Extracts the visible text of the whole document, one block per line
pub fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    collect_text(document.root_element(), &mut out);
    normalize_lines(&out)
}

/// Trimmed, whitespace-collapsed text of one element
pub fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace_in_segment(&element.text().collect::<Vec<_>>().join(" "))
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if INVISIBLE_TAGS.contains(&name) {
        return;
    }

    let block = BLOCK_TAGS.contains(&name);
    if block {
        out.push('\n');
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_text(child_element, out);
                }
            }
            _ => {}
        }
    }

    if block {
        out.push('\n');
    }
}

/// Image URLs in document order.
///
/// Uses `src`, then the lazy-loading `data-src`/`data-lazy-src` attributes,
/// resolves against `base`, and keeps only http(s) URLs.
pub fn extract_images(document: &Html, base: Option<&Url>) -> Result<Vec<String>, ExtractError> {
    let img = selector("img")?;

    let images = document
        .select(&img)
        .filter_map(|element| {
            let attrs = element.value();
            ["src", "data-src", "data-lazy-src"]
                .iter()
                .filter_map(|name| attrs.attr(name))
                .map(str::trim)
                .find(|value| !value.is_empty())
        })
        .filter_map(|src| resolve(src, base))
        .collect::<Vec<String>>();

    ::log::debug!("HTML parser found {} images", images.len());
    Ok(images)
}

/// Anchors with non-empty text and an href, resolved against `base`, in
/// document order. Any scheme is kept, as the browser reports it.
pub fn extract_links(document: &Html, base: Option<&Url>) -> Result<Vec<Link>, ExtractError> {
    let anchor = selector("a[href]")?;

    let links = document
        .select(&anchor)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            let text = element_text(element);
            if text.is_empty() || href.is_empty() {
                return None;
            }
            let url = absolutize(href, base)?;
            Some(Link {
                text,
                url: url.to_string(),
            })
        })
        .collect::<Vec<Link>>();

    ::log::debug!("HTML parser found {} links", links.len());
    if !links.is_empty() {
        ::log::trace!(
            "First few links: {:?}",
            links.iter().take(5).map(|l| &l.url).collect::<Vec<_>>()
        );
    }

    Ok(links)
}

/// Resolves `reference` against `base`, or parses it as absolute
fn absolutize(reference: &str, base: Option<&Url>) -> Option<Url> {
    match base {
        Some(base) => base.join(reference).ok(),
        None => Url::parse(reference).ok(),
    }
}

/// Resolves `reference` to an absolute http(s) URL
fn resolve(reference: &str, base: Option<&Url>) -> Option<String> {
    let url = absolutize(reference, base)?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
