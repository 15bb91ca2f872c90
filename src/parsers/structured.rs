//! Structured-data extraction: tables, lists, headings, contacts and dates.
//!
//! Runs over the original parsed document rather than the cleaned
//! main-content region, so tables and lists outside that region survive.
//! Each category is extracted on its own; a failing category is reported as
//! a skipped step and left empty while the others still come through.

use crate::parsers::html::{element_text, visible_text};
use crate::parsers::{ExtractError, selector};
use crate::patterns::{self, Candidate, Matcher};
use crate::results::{ContactInfo, SkippedStep, StepOutcome, StructuredData, Table};
use scraper::{ElementRef, Html};
use std::collections::{BTreeMap, BTreeSet};

/// Extracts the structured-data bundle, dropping skip reports
pub fn extract_structured(document: &Html) -> StructuredData {
    extract_structured_with_report(document).0
}

/// Extracts the structured-data bundle along with the steps that were skipped
pub fn extract_structured_with_report(document: &Html) -> (StructuredData, Vec<SkippedStep>) {
    let mut skipped = Vec::new();
    let text = visible_text(document);

    let tables = StepOutcome::from(extract_tables(document)).record("tables", &mut skipped);
    let lists = StepOutcome::from(extract_lists(document)).record("lists", &mut skipped);
    let headings = StepOutcome::from(extract_headings(document)).record("headings", &mut skipped);

    let data = StructuredData {
        tables,
        lists,
        headings,
        contact_info: extract_contact_info(&text),
        dates: extract_dates(&text),
    };

    (data, skipped)
}

/// Every `<table>` as rows of trimmed cell text; empty rows and tables dropped
pub fn extract_tables(document: &Html) -> Result<Vec<Table>, ExtractError> {
    let table_sel = selector("table")?;

    let tables = document
        .select(&table_sel)
        .map(|table| {
            own_rows(table)
                .map(row_cells)
                .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
                .collect::<Table>()
        })
        .filter(|rows| !rows.is_empty())
        .collect::<Vec<Table>>();

    ::log::debug!("Found {} tables", tables.len());
    Ok(tables)
}

/// Rows of `table` itself, never those of a table nested in one of its cells
fn own_rows(table: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    table
        .children()
        .filter_map(ElementRef::wrap)
        .flat_map(|child| match child.value().name() {
            "tr" => vec![child],
            "thead" | "tbody" | "tfoot" => direct_children(child, &["tr"]).collect(),
            _ => Vec::new(),
        })
}

/// Trimmed text of the direct `<th>`/`<td>` children of a row, empty cells
/// included so columns stay aligned
fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    direct_children(row, &["th", "td"]).map(element_text).collect()
}

/// Every `<ul>`/`<ol>` as the text of its direct `<li>` items
pub fn extract_lists(document: &Html) -> Result<Vec<Vec<String>>, ExtractError> {
    let list_sel = selector("ul, ol")?;

    let lists = document
        .select(&list_sel)
        .map(|list| {
            direct_children(list, &["li"])
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<String>>()
        })
        .filter(|items| !items.is_empty())
        .collect::<Vec<_>>();

    ::log::debug!("Found {} lists", lists.len());
    Ok(lists)
}

/// Heading text keyed by level (`h1`..`h6`); levels without headings are absent
pub fn extract_headings(document: &Html) -> Result<BTreeMap<String, Vec<String>>, ExtractError> {
    let mut headings = BTreeMap::new();

    for level in 1..=6 {
        let tag = format!("h{}", level);
        let sel = selector(&tag)?;
        let texts = document
            .select(&sel)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<String>>();

        if !texts.is_empty() {
            headings.insert(tag, texts);
        }
    }

    Ok(headings)
}

/// Emails, phone numbers and contact names found in `text`
pub fn extract_contact_info(text: &str) -> ContactInfo {
    let emails = patterns::email_matcher()
        .find_all(text)
        .map(|c| c.text)
        .collect::<BTreeSet<String>>();

    ContactInfo {
        emails,
        phones: longest_only(collect(patterns::phone_matchers(), text)),
        names: collect(patterns::name_matchers(), text),
    }
}

/// Numeric and Spanish month-name dates found in `text`
pub fn extract_dates(text: &str) -> BTreeSet<String> {
    collect(patterns::date_matchers(), text)
}

fn collect(matchers: &[Matcher], text: &str) -> BTreeSet<String> {
    matchers
        .iter()
        .flat_map(|m| m.find_all(text))
        .map(|Candidate { text, .. }| text)
        .collect()
}

/// Drops values that are a substring of another value in the set, so a local
/// phone match does not repeat inside its international form
fn longest_only(values: BTreeSet<String>) -> BTreeSet<String> {
    values
        .iter()
        .filter(|value| {
            !values
                .iter()
                .any(|other| other.len() > value.len() && other.contains(value.as_str()))
        })
        .cloned()
        .collect()
}

/// Direct element children of `parent` with one of the given tag names
fn direct_children<'a>(
    parent: ElementRef<'a>,
    names: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| names.contains(&child.value().name()))
}
