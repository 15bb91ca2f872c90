pub mod amounts;
pub mod clean;
pub mod html;
pub mod structured;
pub mod text;


use scraper::Selector;

/// Failure of a single best-effort extraction step
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// A CSS selector could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
}

/// Parses a CSS selector, reporting failures as an [`ExtractError`]
pub fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })
}
