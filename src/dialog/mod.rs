//! Cookie-consent dialog dismissal.
//!
//! The resolver walks an ordered chain of [`DialogStrategy`] objects against a
//! live page and stops at the first one that clicks something. Every failure
//! inside a strategy is absorbed there; the resolver itself only ever answers
//! "handled" or "not handled".

mod strategies;

pub use strategies::{FrameScopedStrategy, SelectorStrategy, TextMatchStrategy};

use crate::config::DialogConfig;
use crate::results::StepOutcome;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Consent button labels tried by the text strategy, highest priority first
pub const CONSENT_LABELS: &[&str] = &[
    "Accept All",
    "Accept all",
    "Accept All Cookies",
    "Accept all cookies",
    "Accept Cookies",
    "Accept",
    "I Accept",
    "I agree",
    "I Agree",
    "Agree",
    "Agree and continue",
    "Allow All",
    "Allow all",
    "Allow all cookies",
    "Allow",
    "Continue",
    "OK",
    "Ok",
    "Got it",
    "Got it!",
    // Non-English fallbacks
    "Aceptar todo",
    "Aceptar todas",
    "Aceptar",
    "Acepto",
    "Tout accepter",
    "J'accepte",
    "Accepter",
    "Alle akzeptieren",
    "Akzeptieren",
    "Accetta tutto",
    "Accetta",
    "Aceitar todos",
    "Aceitar",
];

/// Accept buttons of common consent frameworks
pub const CONSENT_SELECTORS: &[&str] = &[
    "#onetrust-accept-btn-handler",
    "#accept-recommended-btn-handler",
    "#CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll",
    "#CybotCookiebotDialogBodyButtonAccept",
    "#didomi-notice-agree-button",
    ".qc-cmp2-summary-buttons button[mode='primary']",
    "#truste-consent-button",
    ".osano-cm-accept-all",
    ".cc-allow",
    ".cc-accept",
    ".cc-dismiss",
    "#cookie-accept",
    "#accept-cookies",
    "#cookieAccept",
    "button[data-testid='cookie-policy-manage-dialog-accept-button']",
    "button[aria-label*='accept' i]",
    "[id*='cookie'] button",
    "[class*='cookie'] button",
    "[id*='consent'] button",
    "[class*='consent'] button",
];

/// Failure of one interaction with a live page
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("no element matching {0}")]
    NotFound(String),

    #[error("frame {0} is not available")]
    NoSuchFrame(usize),

    #[error("driver error: {0}")]
    Driver(String),
}

/// Operations the resolver needs from a live browser page
#[async_trait]
pub trait LivePage: Send + Sync {
    /// Labels from `labels` currently shown as some element's exact visible
    /// text, answered with a single query and no waiting
    async fn visible_texts(&self, labels: &[String]) -> Result<Vec<String>, PageError>;

    /// Selectors from `selectors` currently matching at least one element,
    /// answered with a single query and no waiting
    async fn matching_selectors(&self, selectors: &[String]) -> Result<Vec<String>, PageError>;

    /// Clicks the element whose visible text is exactly `text`
    async fn click_by_text(&self, text: &str, timeout: Duration) -> Result<(), PageError>;

    /// Clicks the first element matching the CSS `selector`
    async fn click_by_selector(&self, selector: &str, timeout: Duration) -> Result<(), PageError>;

    /// Number of child frames in the current browsing context
    async fn frame_count(&self) -> Result<usize, PageError>;

    /// Switches into the child frame at `index`
    async fn enter_frame(&self, index: usize) -> Result<(), PageError>;

    /// Switches back to the parent browsing context
    async fn leave_frame(&self) -> Result<(), PageError>;

    /// Switches back to the top-level browsing context
    async fn top_frame(&self) -> Result<(), PageError>;
}

/// One way of finding and dismissing a consent dialog
#[async_trait]
pub trait DialogStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns true when the strategy clicked something
    async fn attempt(&self, page: &dyn LivePage) -> bool;
}

/// Bound for switching back to the top-level context after an interrupted run
const FRAME_RESET_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs one page interaction with a time limit, turning every failure into a
/// skip reason
pub async fn bounded<T, F>(limit: Duration, action: F) -> StepOutcome<T>
where
    F: Future<Output = Result<T, PageError>>,
{
    match tokio::time::timeout(limit, action).await {
        Ok(Ok(value)) => StepOutcome::Ok(value),
        Ok(Err(e)) => StepOutcome::Skipped(e.to_string()),
        Err(_) => StepOutcome::Skipped(format!("timed out after {} ms", limit.as_millis())),
    }
}

/// Ordered strategy chain; the first strategy that succeeds wins
pub struct CookieDialogResolver {
    initial_delay: Duration,
    budget: Option<Duration>,
    strategies: Vec<Box<dyn DialogStrategy>>,
}

impl CookieDialogResolver {
    /// Builds the standard chain: text match, known selectors, then text
    /// match inside child frames
    pub fn from_config(config: &DialogConfig) -> Self {
        let labels = CONSENT_LABELS
            .iter()
            .map(|s| s.to_string())
            .chain(config.labels.iter().cloned())
            .collect::<Vec<_>>();
        let selectors = CONSENT_SELECTORS
            .iter()
            .map(|s| s.to_string())
            .chain(config.selectors.iter().cloned())
            .collect::<Vec<_>>();

        let text = TextMatchStrategy::new(labels, config.attempt_timeout(), config.after_click_delay());
        let strategies: Vec<Box<dyn DialogStrategy>> = vec![
            Box::new(text.clone()),
            Box::new(SelectorStrategy::new(
                selectors,
                config.attempt_timeout(),
                config.after_click_delay(),
            )),
            Box::new(FrameScopedStrategy::new(text, config.attempt_timeout())),
        ];

        Self::with_strategies(config.initial_delay(), strategies).with_budget(config.budget())
    }

    /// Chain without an overall time limit
    pub fn with_strategies(initial_delay: Duration, strategies: Vec<Box<dyn DialogStrategy>>) -> Self {
        Self {
            initial_delay,
            budget: None,
            strategies,
        }
    }

    /// Caps the whole run, initial delay included
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Tries to dismiss a consent dialog; true iff some strategy clicked
    /// before the budget ran out
    pub async fn resolve(&self, page: &dyn LivePage) -> bool {
        let budget = match self.budget {
            Some(budget) => budget,
            None => return self.run_chain(page).await,
        };

        match tokio::time::timeout(budget, self.run_chain(page)).await {
            Ok(handled) => handled,
            Err(_) => {
                ::log::warn!(
                    "Cookie dialog handling stopped after {} ms without a click",
                    budget.as_millis()
                );
                // The chain may have been cut off inside a child frame
                if let StepOutcome::Skipped(reason) =
                    bounded(FRAME_RESET_TIMEOUT, page.top_frame()).await
                {
                    ::log::warn!("Could not return to the top-level frame: {}", reason);
                }
                false
            }
        }
    }

    async fn run_chain(&self, page: &dyn LivePage) -> bool {
        if !self.initial_delay.is_zero() {
            tokio::time::sleep(self.initial_delay).await;
        }

        for strategy in &self.strategies {
            ::log::debug!("Trying cookie dialog strategy '{}'", strategy.name());
            if strategy.attempt(page).await {
                ::log::info!("Cookie dialog dismissed by '{}' strategy", strategy.name());
                return true;
            }
        }

        ::log::debug!("No cookie dialog handled");
        false
    }
}

#[cfg(test)]
mod tests;
