use crate::parsers::ExtractError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Rendered document snapshot handed over by the browser driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// URL the page was loaded from, used to resolve relative references
    pub url: String,

    /// Document title as reported by the browser
    pub title: String,

    /// Serialized DOM after scripts ran
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            html: html.into(),
        }
    }
}

/// A hyperlink with its visible text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

/// Rows of cell text
pub type Table = Vec<Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    pub names: BTreeSet<String>,
}

/// Non-markdown extraction bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredData {
    pub tables: Vec<Table>,
    pub lists: Vec<Vec<String>>,
    /// Heading text keyed by `h1`..`h6`
    pub headings: BTreeMap<String, Vec<String>>,
    pub contact_info: ContactInfo,
    pub dates: BTreeSet<String>,
}

/// A best-effort step that produced nothing because it failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedStep {
    pub step: String,
    pub reason: String,
}

/// Result of a best-effort step: either its value or the reason it was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome<T> {
    Ok(T),
    Skipped(String),
}

impl<T> From<Result<T, ExtractError>> for StepOutcome<T> {
    fn from(result: Result<T, ExtractError>) -> Self {
        match result {
            Ok(value) => StepOutcome::Ok(value),
            Err(e) => StepOutcome::Skipped(e.to_string()),
        }
    }
}

impl<T> StepOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, StepOutcome::Ok(_))
    }
}

impl<T: Default> StepOutcome<T> {
    /// Unwraps the value, or logs the skip, appends it to `skipped` and
    /// returns an empty value
    pub fn record(self, step: &str, skipped: &mut Vec<SkippedStep>) -> T {
        match self {
            StepOutcome::Ok(value) => value,
            StepOutcome::Skipped(reason) => {
                ::log::warn!("Skipped extraction step '{}': {}", step, reason);
                skipped.push(SkippedStep {
                    step: step.to_string(),
                    reason,
                });
                T::default()
            }
        }
    }
}

/// Read-only summary counters derived from the assembled content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    /// Length of the markdown in characters
    pub content_length: usize,
    pub images_count: usize,
    pub links_count: usize,
    pub amounts_found: usize,
    pub has_tables: bool,
    pub has_lists: bool,
    pub headings_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_steps: Vec<SkippedStep>,
}

impl Metadata {
    /// Derives the counters from already-built entities
    pub fn derive(
        title: &str,
        markdown: &str,
        images: &[String],
        links: &[Link],
        amounts: &BTreeSet<String>,
        structured: &StructuredData,
        skipped_steps: Vec<SkippedStep>,
    ) -> Self {
        Self {
            title: title.to_string(),
            content_length: markdown.chars().count(),
            images_count: images.len(),
            links_count: links.len(),
            amounts_found: amounts.len(),
            has_tables: !structured.tables.is_empty(),
            has_lists: !structured.lists.is_empty(),
            headings_count: structured.headings.values().map(Vec::len).sum(),
            skipped_steps,
        }
    }
}

/// Final output of one extraction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedContent {
    pub url: String,
    pub title: String,
    pub markdown_content: String,
    pub metadata: Metadata,
    pub images: Vec<String>,
    pub links: Vec<Link>,
    pub amounts: BTreeSet<String>,
    pub structured_data: StructuredData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_derivation() {
        let mut structured = StructuredData::default();
        structured.tables.push(vec![vec!["a".to_string()]]);
        structured
            .headings
            .insert("h1".to_string(), vec!["One".to_string()]);
        structured
            .headings
            .insert("h3".to_string(), vec!["Two".to_string(), "Three".to_string()]);

        let amounts = BTreeSet::from(["$1".to_string(), "$2".to_string()]);
        let metadata = Metadata::derive(
            "Title",
            "# Título",
            &["https://example.com/a.png".to_string()],
            &[],
            &amounts,
            &structured,
            Vec::new(),
        );

        assert_eq!(metadata.content_length, 8);
        assert_eq!(metadata.images_count, 1);
        assert_eq!(metadata.links_count, 0);
        assert_eq!(metadata.amounts_found, 2);
        assert!(metadata.has_tables);
        assert!(!metadata.has_lists);
        assert_eq!(metadata.headings_count, 3);
    }

    #[test]
    fn test_step_outcome_record() {
        let mut skipped = Vec::new();

        let ok: StepOutcome<Vec<u8>> = StepOutcome::Ok(vec![1]);
        assert_eq!(ok.record("ok", &mut skipped), vec![1]);
        assert!(skipped.is_empty());

        let failed: StepOutcome<Vec<u8>> = StepOutcome::from(Err(ExtractError::Selector {
            selector: "[".to_string(),
            reason: "unexpected end".to_string(),
        }));
        assert!(!failed.is_ok());
        assert!(failed.record("tables", &mut skipped).is_empty());
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].step, "tables");
    }

    #[test]
    fn test_serialized_field_names() {
        let content = ScrapedContent {
            url: "https://example.com".to_string(),
            title: "Example".to_string(),
            markdown_content: String::new(),
            metadata: Metadata::derive("Example", "", &[], &[], &BTreeSet::new(), &StructuredData::default(), Vec::new()),
            images: Vec::new(),
            links: Vec::new(),
            amounts: BTreeSet::new(),
            structured_data: StructuredData::default(),
        };
        let json = serde_json::to_value(&content).unwrap();
        assert!(json.get("markdown_content").is_some());
        assert!(json["structured_data"].get("contact_info").is_some());
        assert!(json["metadata"].get("skipped_steps").is_none());
        assert_eq!(json["metadata"]["has_tables"], false);
    }
}
