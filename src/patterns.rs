//! Fixed pattern library for the extraction heuristics.
//!
//! Every pattern is a [`Matcher`] tagged with the [`Category`] it detects and a
//! rough [`Confidence`], so callers can pick matchers by tag instead of
//! reaching into one regex bank.

use regex::Regex;
use std::sync::LazyLock;

/// What a matcher detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `$`, `€` or `£` followed by a number
    CurrencySymbolAmount,
    /// A number followed by a three-letter currency code
    CurrencyCodeAmount,
    /// Thousands-grouped number with no currency marker
    GroupedNumber,
    /// Numeric date with `/` or `-` separators
    NumericDate,
    /// Spanish month-name date, e.g. "5 de marzo de 2024"
    SpanishDate,
    Email,
    Phone,
    /// Person name found next to a contact cue
    ContactName,
}

/// How much a match from a given matcher can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A single match produced by a [`Matcher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub text: String,
    pub category: Category,
    pub confidence: Confidence,
}

/// A tagged regex pattern
#[derive(Debug)]
pub struct Matcher {
    pub category: Category,
    pub confidence: Confidence,
    regex: Regex,
    /// Capture group holding the value; 0 is the whole match
    group: usize,
}

impl Matcher {
    fn new(category: Category, confidence: Confidence, pattern: &str) -> Self {
        Self::with_group(category, confidence, pattern, 0)
    }

    fn with_group(category: Category, confidence: Confidence, pattern: &str, group: usize) -> Self {
        let regex = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("built-in {:?} pattern should compile: {}", category, e));
        Self {
            category,
            confidence,
            regex,
            group,
        }
    }

    /// Runs the pattern over `text`, yielding trimmed, non-empty candidates
    pub fn find_all<'a>(&'a self, text: &'a str) -> impl Iterator<Item = Candidate> + 'a {
        self.regex.captures_iter(text).filter_map(move |caps| {
            let value = caps.get(self.group)?.as_str().trim();
            if value.is_empty() {
                return None;
            }
            Some(Candidate {
                text: value.to_string(),
                category: self.category,
                confidence: self.confidence,
            })
        })
    }
}

/// Currency codes recognised after a bare number
pub const CURRENCY_CODES: &[&str] = &["USD", "EUR", "GBP", "MXN", "ARS", "COP", "PEN", "CLP"];

/// Titles that mark an adjacent capitalized name as a contact
pub const CONTACT_TITLES: &[&str] = &[
    "Director",
    "Directora",
    "CEO",
    "CTO",
    "CFO",
    "COO",
    "Manager",
    "Gerente",
    "Founder",
    "Fundador",
    "President",
    "Presidente",
];

static AMOUNT_MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    let codes = CURRENCY_CODES.join("|");
    vec![
        Matcher::new(
            Category::CurrencySymbolAmount,
            Confidence::High,
            r"(?i)[$€£]\s?\d+(?:[.,]\d{3})*(?:[.,]\d{1,2})?",
        ),
        Matcher::new(
            Category::CurrencyCodeAmount,
            Confidence::High,
            &format!(r"(?i)\b\d+(?:[.,]\d{{3}})*(?:[.,]\d{{1,2}})?\s?(?:{})\b", codes),
        ),
        Matcher::new(
            Category::GroupedNumber,
            Confidence::Low,
            r"(?i)\b\d{1,3}(?:[.,]\d{3})+(?:[.,]\d{1,2})?\b",
        ),
    ]
});

static DATE_MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![
        Matcher::new(
            Category::NumericDate,
            Confidence::Medium,
            r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b",
        ),
        Matcher::new(
            Category::NumericDate,
            Confidence::Medium,
            r"\b\d{4}[/-]\d{1,2}[/-]\d{1,2}\b",
        ),
        Matcher::new(
            Category::SpanishDate,
            Confidence::High,
            r"(?i)\b\d{1,2}\s+de\s+(?:enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre)(?:\s+de\s+\d{4})?\b",
        ),
    ]
});

static EMAIL_MATCHER: LazyLock<Matcher> = LazyLock::new(|| {
    Matcher::new(
        Category::Email,
        Confidence::High,
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
    )
});

static PHONE_MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    vec![
        // International form: +54 11 4321-5678, +1 (555) 123-4567
        Matcher::new(
            Category::Phone,
            Confidence::High,
            r"\+\d{1,3}[\s.-]?(?:\(\d{1,4}\)[\s.-]?)?\d{1,4}(?:[\s.-]?\d{2,4}){1,3}",
        ),
        // Local form: (555) 123-4567, 555-123-4567, 555.123.4567
        Matcher::new(
            Category::Phone,
            Confidence::Medium,
            r"(?:\(\d{2,4}\)\s?|\b\d{2,4}[\s.-])\d{3,4}[\s.-]\d{4}\b",
        ),
    ]
});

static NAME_MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    const NAME: &str = r"[A-ZÁÉÍÓÚÑ][a-záéíóúñ]+\s+[A-ZÁÉÍÓÚÑ][a-záéíóúñ]+";
    let titles = CONTACT_TITLES.join("|");
    vec![
        Matcher::with_group(
            Category::ContactName,
            Confidence::High,
            &format!(r"(?i:contact|contacto|name|nombre)\s*:\s*({})", NAME),
            1,
        ),
        Matcher::with_group(
            Category::ContactName,
            Confidence::Medium,
            &format!(r"({})\s*[,\-–]?\s*(?:{})\b", NAME, titles),
            1,
        ),
        Matcher::with_group(
            Category::ContactName,
            Confidence::Medium,
            &format!(r"\b(?:{})\s*[,:\-–]?\s*({})", titles, NAME),
            1,
        ),
        Matcher::with_group(
            Category::ContactName,
            Confidence::Medium,
            &format!(r"\b(?:Mr|Mrs|Ms|Dr|Sr|Sra|Srta)\.?\s+({})", NAME),
            1,
        ),
    ]
});

/// Monetary matchers, strongest first
pub fn amount_matchers() -> &'static [Matcher] {
    &AMOUNT_MATCHERS
}

pub fn date_matchers() -> &'static [Matcher] {
    &DATE_MATCHERS
}

pub fn email_matcher() -> &'static Matcher {
    &EMAIL_MATCHER
}

pub fn phone_matchers() -> &'static [Matcher] {
    &PHONE_MATCHERS
}

pub fn name_matchers() -> &'static [Matcher] {
    &NAME_MATCHERS
}

/// Tag selectors whose subtrees never carry page content
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Class-name pattern used to spot a main-content container
pub static CONTENT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)content|main|article").expect("CONTENT_CLASS should compile")
});

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(matcher: &Matcher, input: &str) -> Vec<String> {
        matcher.find_all(input).map(|c| c.text).collect()
    }

    #[test]
    fn test_all_builtin_patterns_compile() {
        assert_eq!(amount_matchers().len(), 3);
        assert_eq!(date_matchers().len(), 3);
        assert_eq!(phone_matchers().len(), 2);
        assert_eq!(name_matchers().len(), 4);
        assert_eq!(email_matcher().category, Category::Email);
    }

    #[test]
    fn test_candidates_carry_tags() {
        let candidates: Vec<Candidate> = amount_matchers()[0].find_all("Price: $10").collect();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "$10");
        assert_eq!(candidates[0].category, Category::CurrencySymbolAmount);
        assert_eq!(candidates[0].confidence, Confidence::High);
    }

    #[test]
    fn test_spanish_date() {
        let found = texts(&date_matchers()[2], "Publicado el 5 de Marzo de 2024.");
        assert_eq!(found, vec!["5 de Marzo de 2024"]);
    }

    #[test]
    fn test_name_after_cue() {
        let found: Vec<String> = name_matchers()
            .iter()
            .flat_map(|m| texts(m, "Contact: Maria Lopez"))
            .collect();
        assert!(found.contains(&"Maria Lopez".to_string()));
    }

    #[test]
    fn test_name_next_to_title() {
        let found: Vec<String> = name_matchers()
            .iter()
            .flat_map(|m| texts(m, "Our team is led by John Smith, CEO of the company."))
            .collect();
        assert!(found.contains(&"John Smith".to_string()));
    }

    #[test]
    fn test_content_class_pattern() {
        assert!(CONTENT_CLASS.is_match("page-Content wrapper"));
        assert!(CONTENT_CLASS.is_match("main-column"));
        assert!(!CONTENT_CLASS.is_match("sidebar"));
    }
}
