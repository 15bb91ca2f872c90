use crate::config::ExtractionConfig;
use crate::error::ScrapeError;
use crate::markdown::{HtmdRenderer, MarkdownRenderer};
use crate::parsers::{amounts, clean, html, structured};
use crate::results::{Metadata, RenderedPage, ScrapedContent, SkippedStep, StepOutcome};
use scraper::Html;
use url::Url;

/// Turns a rendered page snapshot into [`ScrapedContent`].
///
/// Sequence: clean → render markdown → structured data → amounts → images
/// and links → metadata. Only a markdown failure aborts; every other step
/// degrades to an empty field plus an entry in `metadata.skipped_steps`.
pub struct ContentPipeline {
    limits: ExtractionConfig,
    renderer: Box<dyn MarkdownRenderer>,
}

impl ContentPipeline {
    pub fn new(limits: ExtractionConfig) -> Self {
        Self {
            limits,
            renderer: Box::new(HtmdRenderer::new()),
        }
    }

    /// Replace the markdown renderer
    pub fn with_renderer(mut self, renderer: Box<dyn MarkdownRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn assemble(&self, page: &RenderedPage) -> Result<ScrapedContent, ScrapeError> {
        let document = Html::parse_document(&page.html);
        let base = Url::parse(&page.url).ok();
        let mut skipped = Vec::new();

        let cleaned = match StepOutcome::from(clean::clean_document(&document)) {
            StepOutcome::Ok(cleaned) => cleaned,
            StepOutcome::Skipped(reason) => {
                ::log::warn!("Cleaner failed, rendering the raw document: {}", reason);
                skipped.push(SkippedStep {
                    step: "clean".to_string(),
                    reason,
                });
                page.html.clone()
            }
        };

        let markdown_content = self.renderer.render(&cleaned).map_err(ScrapeError::Rendering)?;

        let (structured_data, structured_skips) = structured::extract_structured_with_report(&document);
        skipped.extend(structured_skips);

        let text = html::visible_text(&document);
        let amounts = amounts::extract_amounts(&text);

        let mut images = StepOutcome::from(html::extract_images(&document, base.as_ref()))
            .record("images", &mut skipped);
        images.truncate(self.limits.max_images);

        let mut links = StepOutcome::from(html::extract_links(&document, base.as_ref()))
            .record("links", &mut skipped);
        links.truncate(self.limits.max_links);

        let metadata = Metadata::derive(
            &page.title,
            &markdown_content,
            &images,
            &links,
            &amounts,
            &structured_data,
            skipped,
        );

        ::log::debug!(
            "Assembled {}: {} chars of markdown, {} images, {} links, {} amounts",
            page.url,
            metadata.content_length,
            metadata.images_count,
            metadata.links_count,
            metadata.amounts_found
        );

        Ok(ScrapedContent {
            url: page.url.clone(),
            title: page.title.clone(),
            markdown_content,
            metadata,
            images,
            links,
            amounts,
            structured_data,
        })
    }
}

impl Default for ContentPipeline {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}
