use super::{DialogStrategy, LivePage, bounded};
use crate::results::StepOutcome;
use async_trait::async_trait;
use std::time::Duration;

/// Clicks the first element whose visible text equals one of the labels
#[derive(Debug, Clone)]
pub struct TextMatchStrategy {
    labels: Vec<String>,
    attempt_timeout: Duration,
    after_click_delay: Duration,
}

impl TextMatchStrategy {
    pub fn new(labels: Vec<String>, attempt_timeout: Duration, after_click_delay: Duration) -> Self {
        Self {
            labels,
            attempt_timeout,
            after_click_delay,
        }
    }
}

#[async_trait]
impl DialogStrategy for TextMatchStrategy {
    fn name(&self) -> &'static str {
        "text-match"
    }

    async fn attempt(&self, page: &dyn LivePage) -> bool {
        let present = match bounded(self.attempt_timeout, page.visible_texts(&self.labels)).await {
            StepOutcome::Ok(present) => present,
            StepOutcome::Skipped(reason) => {
                ::log::trace!("Consent label lookup skipped: {}", reason);
                return false;
            }
        };

        for label in in_priority_order(&self.labels, &present) {
            match bounded(self.attempt_timeout, page.click_by_text(label, self.attempt_timeout)).await {
                StepOutcome::Ok(()) => {
                    ::log::debug!("Clicked consent button '{}'", label);
                    settle(self.after_click_delay).await;
                    return true;
                }
                StepOutcome::Skipped(reason) => {
                    ::log::trace!("Label '{}' skipped: {}", label, reason);
                }
            }
        }
        false
    }
}

/// Clicks the first match among selectors of known consent frameworks
#[derive(Debug, Clone)]
pub struct SelectorStrategy {
    selectors: Vec<String>,
    attempt_timeout: Duration,
    after_click_delay: Duration,
}

impl SelectorStrategy {
    pub fn new(selectors: Vec<String>, attempt_timeout: Duration, after_click_delay: Duration) -> Self {
        Self {
            selectors,
            attempt_timeout,
            after_click_delay,
        }
    }
}

#[async_trait]
impl DialogStrategy for SelectorStrategy {
    fn name(&self) -> &'static str {
        "selector"
    }

    async fn attempt(&self, page: &dyn LivePage) -> bool {
        let present = match bounded(self.attempt_timeout, page.matching_selectors(&self.selectors)).await {
            StepOutcome::Ok(present) => present,
            StepOutcome::Skipped(reason) => {
                ::log::trace!("Consent selector lookup skipped: {}", reason);
                return false;
            }
        };

        for selector in in_priority_order(&self.selectors, &present) {
            match bounded(
                self.attempt_timeout,
                page.click_by_selector(selector, self.attempt_timeout),
            )
            .await
            {
                StepOutcome::Ok(()) => {
                    ::log::debug!("Clicked consent selector '{}'", selector);
                    settle(self.after_click_delay).await;
                    return true;
                }
                StepOutcome::Skipped(reason) => {
                    ::log::trace!("Selector '{}' skipped: {}", selector, reason);
                }
            }
        }
        false
    }
}

/// Re-runs a text-match strategy inside every child frame.
///
/// Consent banners are often served from a third-party iframe that the
/// top-level strategies cannot see into.
#[derive(Debug, Clone)]
pub struct FrameScopedStrategy {
    inner: TextMatchStrategy,
    attempt_timeout: Duration,
}

impl FrameScopedStrategy {
    pub fn new(inner: TextMatchStrategy, attempt_timeout: Duration) -> Self {
        Self {
            inner,
            attempt_timeout,
        }
    }
}

#[async_trait]
impl DialogStrategy for FrameScopedStrategy {
    fn name(&self) -> &'static str {
        "frame-text-match"
    }

    async fn attempt(&self, page: &dyn LivePage) -> bool {
        let count = match bounded(self.attempt_timeout, page.frame_count()).await {
            StepOutcome::Ok(count) => count,
            StepOutcome::Skipped(reason) => {
                ::log::trace!("Could not enumerate frames: {}", reason);
                return false;
            }
        };
        ::log::debug!("Searching {} frames for a consent button", count);

        for index in 0..count {
            if let StepOutcome::Skipped(reason) =
                bounded(self.attempt_timeout, page.enter_frame(index)).await
            {
                ::log::trace!("Frame {} skipped: {}", index, reason);
                continue;
            }

            let clicked = self.inner.attempt(page).await;

            if let StepOutcome::Skipped(reason) =
                bounded(self.attempt_timeout, page.leave_frame()).await
            {
                // Frame indices are relative to the parent, so the walk cannot go on
                ::log::warn!("Could not leave frame {}: {}", index, reason);
                if let StepOutcome::Skipped(reason) =
                    bounded(self.attempt_timeout, page.top_frame()).await
                {
                    ::log::warn!("Could not return to the top-level frame: {}", reason);
                }
                return clicked;
            }

            if clicked {
                ::log::debug!("Consent button clicked inside frame {}", index);
                return true;
            }
        }
        false
    }
}

/// Candidates that are present, in the order they were configured
fn in_priority_order<'a>(candidates: &'a [String], present: &'a [String]) -> impl Iterator<Item = &'a String> + 'a {
    candidates
        .iter()
        .filter(move |candidate| present.contains(candidate))
}

async fn settle(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
