pub mod browser;
pub mod config;
pub mod dialog;
pub mod error;
pub mod markdown;
pub mod parsers;
pub mod patterns;
pub mod pipeline;
pub mod results;

// Re-export commonly used types for convenience
pub use config::ScrapeConfig;
pub use error::{ErrorKind, Failure, ScrapeError};
pub use pipeline::ContentPipeline;
pub use results::{RenderedPage, ScrapedContent, StructuredData};

use markdown::MarkdownRenderer;
use std::time::Instant;
use url::Url;

/// Main builder for scraping a single page
pub struct Scrape {
    url: String,
    config: ScrapeConfig,
    explicit_webdriver_url: bool,
    renderer: Option<Box<dyn MarkdownRenderer>>,
}

impl Scrape {
    /// Create a new Scrape builder for the given page URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            config: ScrapeConfig::default(),
            explicit_webdriver_url: false,
            renderer: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: ScrapeConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self, ScrapeError> {
        let config = ScrapeConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a JSON string
    pub fn with_config_str(self, json: &str) -> Result<Self, ScrapeError> {
        let config = ScrapeConfig::from_json(json)?;
        Ok(self.with_config(config))
    }

    /// Override the WebDriver URL; takes precedence over `WEBDRIVER_URL`
    pub fn with_webdriver_url(mut self, webdriver_url: impl Into<String>) -> Self {
        self.config.browser.webdriver_url = webdriver_url.into();
        self.explicit_webdriver_url = true;
        self
    }

    /// Enable or disable cookie-consent dialog handling
    pub fn with_dialog_handling(mut self, enabled: bool) -> Self {
        self.config.dialog.enabled = enabled;
        self
    }

    /// Set the maximum number of images kept in the result
    pub fn with_max_images(mut self, max_images: usize) -> Self {
        self.config.extraction.max_images = max_images;
        self
    }

    /// Set the maximum number of links kept in the result
    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.config.extraction.max_links = max_links;
        self
    }

    /// Use a different markdown renderer
    pub fn with_renderer(mut self, renderer: Box<dyn MarkdownRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Render the page in a browser and extract its content
    pub async fn run(mut self) -> Result<ScrapedContent, ScrapeError> {
        let url = validate_url(&self.url)?;
        self.apply_env_webdriver_url(std::env::var("WEBDRIVER_URL").ok());

        ::log::info!("Scraping {}", url);
        let started = Instant::now();

        let rendered = browser::render(url.as_str(), &self.config).await?;

        let content = self.pipeline().assemble(&rendered)?;
        ::log::info!(
            "Scraped {} in {:.2} seconds",
            url,
            started.elapsed().as_secs_f64()
        );
        Ok(content)
    }

    /// Override the WebDriver URL with an environment value, unless one was
    /// set explicitly through the builder
    fn apply_env_webdriver_url(&mut self, env_value: Option<String>) {
        if self.explicit_webdriver_url {
            return;
        }
        if let Some(webdriver_url) = env_value.filter(|url| !url.is_empty()) {
            self.config.browser.webdriver_url = webdriver_url;
        }
    }

    /// Extract content from an already rendered document, no browser involved
    pub fn extract_html(self, title: &str, html: &str) -> Result<ScrapedContent, ScrapeError> {
        let url = validate_url(&self.url)?;
        let page = RenderedPage::new(url.as_str(), title, html);
        self.pipeline().assemble(&page)
    }

    fn pipeline(self) -> ContentPipeline {
        let pipeline = ContentPipeline::new(self.config.extraction);
        match self.renderer {
            Some(renderer) => pipeline.with_renderer(renderer),
            None => pipeline,
        }
    }
}

/// Accepts only absolute http(s) URLs
pub fn validate_url(url: &str) -> Result<Url, ScrapeError> {
    let parsed = Url::parse(url).map_err(|e| ScrapeError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ScrapeError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
