use htmd::HtmlToMarkdown;
use htmd::options::{HeadingStyle, Options};

/// Converts cleaned HTML into markdown
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, html: &str) -> std::io::Result<String>;
}

/// Default renderer backed by `htmd`, emitting ATX (`#`) headings
pub struct HtmdRenderer {
    converter: HtmlToMarkdown,
}

impl HtmdRenderer {
    pub fn new() -> Self {
        let converter = HtmlToMarkdown::builder()
            .options(Options {
                heading_style: HeadingStyle::Atx,
                ..Default::default()
            })
            .skip_tags(vec!["script", "style", "noscript"])
            .build();
        Self { converter }
    }
}

impl Default for HtmdRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for HtmdRenderer {
    fn render(&self, html: &str) -> std::io::Result<String> {
        self.converter.convert(html)
    }
}
