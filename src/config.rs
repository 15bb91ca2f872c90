use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Browser session settings handed to the WebDriver driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// User agent reported by the browser
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Browser UI/content locale
    #[serde(default = "default_locale")]
    pub locale: String,

    /// IANA timezone emulated in the page
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Accept-Language preference list
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Additional command-line switches for the browser
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Page load timeout for navigation
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Wait after dialog handling so late content can render
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Upper bound for a whole page operation
    #[serde(default = "default_total_timeout_ms")]
    pub total_timeout_ms: u64,
}

/// Cookie-consent dialog handling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Whether to try dismissing consent dialogs at all
    #[serde(default = "default_dialog_enabled")]
    pub enabled: bool,

    /// Wait before the first attempt, dialogs often render late
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Bound for each locate/click attempt
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    /// Wait after a successful click
    #[serde(default = "default_after_click_delay_ms")]
    pub after_click_delay_ms: u64,

    /// Upper bound for the whole resolver run, delays included
    #[serde(default = "default_dialog_budget_ms")]
    pub budget_ms: u64,

    /// Button labels tried after the built-in ones
    #[serde(default)]
    pub labels: Vec<String>,

    /// CSS selectors tried after the built-in ones
    #[serde(default)]
    pub selectors: Vec<String>,
}

/// Limits applied when assembling the result
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum number of image URLs kept
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Maximum number of links kept
    #[serde(default = "default_max_links")]
    pub max_links: usize,
}

/// Complete configuration for a scrape request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub dialog: DialogConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Time kept free after the settle delay for reading title and source
pub const SNAPSHOT_RESERVE: Duration = Duration::from_secs(2);

impl ScrapeConfig {
    /// Time the dialog resolver may use when `remaining` is left before the
    /// page deadline: its own budget, shrunk so the settle delay and the
    /// snapshot still fit
    pub fn dialog_budget(&self, remaining: Duration) -> Duration {
        let available = remaining
            .saturating_sub(self.browser.settle_delay())
            .saturating_sub(SNAPSHOT_RESERVE);
        self.dialog.budget().min(available)
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScrapeError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ScrapeError> {
        serde_json::from_str(json).map_err(|e| ScrapeError::Config(e.to_string()))
    }
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_settle_delay_ms() -> u64 {
    5_000
}

fn default_total_timeout_ms() -> u64 {
    60_000
}

fn default_dialog_enabled() -> bool {
    true
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_attempt_timeout_ms() -> u64 {
    1_500
}

fn default_after_click_delay_ms() -> u64 {
    1_000
}

fn default_dialog_budget_ms() -> u64 {
    15_000
}

fn default_max_images() -> usize {
    20
}

fn default_max_links() -> usize {
    50
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            user_agent: default_user_agent(),
            locale: default_locale(),
            timezone: default_timezone(),
            accept_language: default_accept_language(),
            extra_args: Vec::new(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            total_timeout_ms: default_total_timeout_ms(),
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            enabled: default_dialog_enabled(),
            initial_delay_ms: default_initial_delay_ms(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            after_click_delay_ms: default_after_click_delay_ms(),
            budget_ms: default_dialog_budget_ms(),
            labels: Vec::new(),
            selectors: Vec::new(),
        }
    }
}

impl DialogConfig {
    /// Configuration with every delay set to zero, for tests and offline use
    pub fn immediate() -> Self {
        Self {
            initial_delay_ms: 0,
            after_click_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn after_click_delay(&self) -> Duration {
        Duration::from_millis(self.after_click_delay_ms)
    }

    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_images: default_max_images(),
            max_links: default_max_links(),
        }
    }
}
