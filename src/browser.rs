//! WebDriver-backed page rendering.
//!
//! Opens one browser session per request, navigates, lets the cookie dialog
//! resolver act on the live page, waits for late content and takes the HTML
//! snapshot that the extraction pipeline works on.

use crate::config::{BrowserConfig, ScrapeConfig};
use crate::dialog::{CookieDialogResolver, LivePage, PageError};
use crate::error::ScrapeError;
use crate::results::RenderedPage;
use async_trait::async_trait;
use fantoccini::wd::{Capabilities, WebDriverCompatibleCommand};
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, timeout, timeout_at};

/// Live page handle over a fantoccini client
pub struct FantocciniPage {
    client: Client,
}

impl FantocciniPage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn click_locator(&self, locator: Locator<'_>, timeout: Duration) -> Result<(), PageError> {
        let element = self
            .client
            .wait()
            .at_most(timeout)
            .for_element(locator)
            .await
            .map_err(|e| PageError::NotFound(e.to_string()))?;

        element
            .click()
            .await
            .map_err(|e| PageError::Driver(e.to_string()))?;
        Ok(())
    }
}

/// Marks which XPath expressions select at least one node
const XPATH_PRESENCE_SCRIPT: &str = r#"
return arguments[0].map(function (xpath) {
  try {
    return document.evaluate(xpath, document, null,
      XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue !== null;
  } catch (e) {
    return false;
  }
});
"#;

/// Marks which CSS selectors match at least one element
const SELECTOR_PRESENCE_SCRIPT: &str = r#"
return arguments[0].map(function (selector) {
  try {
    return document.querySelector(selector) !== null;
  } catch (e) {
    return false;
  }
});
"#;

impl FantocciniPage {
    /// Runs a presence script over `queries` and keeps the matching `items`
    async fn present(
        &self,
        script: &str,
        queries: Vec<String>,
        items: &[String],
    ) -> Result<Vec<String>, PageError> {
        let value = self
            .client
            .execute(script, vec![json!(queries)])
            .await
            .map_err(|e| PageError::Driver(e.to_string()))?;

        let flags = value
            .as_array()
            .ok_or_else(|| PageError::Driver(format!("unexpected presence result {}", value)))?;

        Ok(items
            .iter()
            .zip(flags)
            .filter(|(_, flag)| flag.as_bool().unwrap_or(false))
            .map(|(item, _)| item.clone())
            .collect())
    }
}

#[async_trait]
impl LivePage for FantocciniPage {
    async fn visible_texts(&self, labels: &[String]) -> Result<Vec<String>, PageError> {
        let xpaths = labels.iter().map(|label| text_xpath(label)).collect();
        self.present(XPATH_PRESENCE_SCRIPT, xpaths, labels).await
    }

    async fn matching_selectors(&self, selectors: &[String]) -> Result<Vec<String>, PageError> {
        self.present(SELECTOR_PRESENCE_SCRIPT, selectors.to_vec(), selectors)
            .await
    }

    async fn click_by_text(&self, text: &str, timeout: Duration) -> Result<(), PageError> {
        let xpath = text_xpath(text);
        self.click_locator(Locator::XPath(&xpath), timeout).await
    }

    async fn click_by_selector(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        self.click_locator(Locator::Css(selector), timeout).await
    }

    async fn frame_count(&self) -> Result<usize, PageError> {
        let value = self
            .client
            .execute("return window.frames.length;", vec![])
            .await
            .map_err(|e| PageError::Driver(e.to_string()))?;

        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| PageError::Driver(format!("unexpected frame count {}", value)))
    }

    async fn enter_frame(&self, index: usize) -> Result<(), PageError> {
        let index16 = u16::try_from(index).map_err(|_| PageError::NoSuchFrame(index))?;
        self.client
            .enter_frame(Some(index16))
            .await
            .map_err(|_| PageError::NoSuchFrame(index))
    }

    async fn leave_frame(&self) -> Result<(), PageError> {
        self.client
            .enter_parent_frame()
            .await
            .map_err(|e| PageError::Driver(e.to_string()))
    }

    async fn top_frame(&self) -> Result<(), PageError> {
        self.client
            .enter_frame(None)
            .await
            .map_err(|e| PageError::Driver(e.to_string()))
    }
}

/// XPath for the innermost element whose normalized text equals `text`
pub fn text_xpath(text: &str) -> String {
    let literal = xpath_literal(text);
    format!(
        "//*[normalize-space(.)={lit} and not(.//*[normalize-space(.)={lit}])]",
        lit = literal
    )
}

/// Quotes `text` as an XPath 1.0 string literal
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts = text
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect::<Vec<_>>()
            .join(", \"'\", ");
        format!("concat({})", parts)
    }
}

/// Chrome DevTools command sent through ChromeDriver's CDP passthrough
#[derive(Debug)]
struct CdpCommand {
    cmd: &'static str,
    params: serde_json::Value,
}

impl WebDriverCompatibleCommand for CdpCommand {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> Result<url::Url, url::ParseError> {
        let session = session_id.unwrap_or_default();
        base_url.join(&format!("session/{}/goog/cdp/execute", session))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        let body = json!({ "cmd": self.cmd, "params": self.params });
        (http::Method::POST, Some(body.to_string()))
    }
}

/// Builds WebDriver capabilities from the browser configuration
pub fn capabilities(config: &BrowserConfig) -> Capabilities {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-features=VizDisplayCompositor".to_string(),
        format!("--user-agent={}", config.user_agent),
        format!("--lang={}", config.locale),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }
    args.extend(config.extra_args.iter().cloned());

    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    // Return after DOMContentLoaded instead of the full load event
    caps.insert("pageLoadStrategy".to_string(), json!("eager"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "prefs": { "intl.accept_languages": config.accept_language },
        }),
    );
    caps
}

/// Connects to the WebDriver instance
async fn connect(config: &BrowserConfig) -> Result<Client, ScrapeError> {
    let caps = capabilities(config);
    let mut builder = ClientBuilder::native();
    builder.capabilities(caps);

    let first_error = match builder.connect(&config.webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", config.webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                config.webdriver_url,
                e
            );
            e
        }
    };

    // If we couldn't connect, try with common alternative URLs
    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://127.0.0.1:4444", // Try with IP instead of localhost
    ];

    for url in fallback_urls.iter() {
        if *url == config.webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = builder.connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(ScrapeError::Connection {
        context: format!("connecting to WebDriver at {}", config.webdriver_url),
        message: first_error.to_string(),
        source: Some(Box::new(first_error)),
    })
}

/// Emulates the configured timezone; failure only costs consistency
async fn apply_timezone(client: &Client, timezone: &str) {
    let cmd = CdpCommand {
        cmd: "Emulation.setTimezoneOverride",
        params: json!({ "timezoneId": timezone }),
    };
    if let Err(e) = client.issue_cmd(cmd).await {
        ::log::warn!("Could not set timezone {}: {}", timezone, e);
    }
}

/// Renders `url` in a fresh browser session and returns the snapshot.
///
/// The whole operation, connecting included, is bounded by the configured
/// total timeout. The session is closed on every path once it exists.
pub async fn render(url: &str, config: &ScrapeConfig) -> Result<RenderedPage, ScrapeError> {
    let total_timeout = config.browser.total_timeout();
    let deadline = Instant::now() + total_timeout;
    let timed_out = || {
        ScrapeError::timeout(
            format!("scraping {}", url),
            format!("page operation exceeded {} ms", total_timeout.as_millis()),
        )
    };

    let client = match timeout_at(deadline, connect(&config.browser)).await {
        Ok(client) => client?,
        Err(_) => return Err(timed_out()),
    };

    let closer = client.clone();
    within_deadline_then(
        deadline,
        render_with_client(&client, url, config, deadline),
        || close_session(closer),
        || {
            ::log::error!("Timeout scraping: {}", url);
            timed_out()
        },
    )
    .await
}

/// Runs `work` until `deadline`, then runs `cleanup` whether or not the work
/// finished in time
async fn within_deadline_then<T, W, F, C>(
    deadline: Instant,
    work: W,
    cleanup: F,
    timed_out: impl FnOnce() -> ScrapeError,
) -> Result<T, ScrapeError>
where
    W: Future<Output = Result<T, ScrapeError>>,
    F: FnOnce() -> C,
    C: Future<Output = ()>,
{
    let result = match timeout_at(deadline, work).await {
        Ok(result) => result,
        Err(_) => Err(timed_out()),
    };
    cleanup().await;
    result
}

async fn close_session(client: Client) {
    if let Err(e) = client.close().await {
        ::log::warn!("Failed to close WebDriver session: {}", e);
    }
}

async fn render_with_client(
    client: &Client,
    url: &str,
    config: &ScrapeConfig,
    deadline: Instant,
) -> Result<RenderedPage, ScrapeError> {
    apply_timezone(client, &config.browser.timezone).await;

    let navigation_timeout = config.browser.navigation_timeout();
    match timeout(navigation_timeout, client.goto(url)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(ScrapeError::from_browser_error(&format!("navigating to {}", url), e));
        }
        Err(_) => {
            return Err(ScrapeError::timeout(
                format!("navigating to {}", url),
                format!("no response within {} ms", navigation_timeout.as_millis()),
            ));
        }
    }
    ::log::debug!("Navigated to {}", url);

    if config.dialog.enabled {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let budget = config.dialog_budget(remaining);
        if budget.is_zero() {
            ::log::warn!("No time left for cookie dialog handling on {}", url);
        } else {
            let page = FantocciniPage::new(client.clone());
            let resolver = CookieDialogResolver::from_config(&config.dialog).with_budget(budget);
            if !resolver.resolve(&page).await {
                ::log::debug!("No cookie dialog dismissed on {}", url);
            }
        }
    }

    let settle = config.browser.settle_delay();
    if !settle.is_zero() {
        tokio::time::sleep(settle).await;
    }

    let title = client
        .title()
        .await
        .map_err(|e| ScrapeError::from_browser_error("reading page title", e))?;
    let html = client
        .source()
        .await
        .map_err(|e| ScrapeError::from_browser_error("getting page source", e))?;

    ::log::debug!("Captured {} bytes of HTML from {}", html.len(), url);
    Ok(RenderedPage::new(url, title, html))
}
