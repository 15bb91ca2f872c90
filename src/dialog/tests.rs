use super::*;
use crate::config::{SNAPSHOT_RESERVE, ScrapeConfig};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory page: clickable labels and selectors per browsing context
#[derive(Default)]
struct MockPage {
    texts: HashSet<String>,
    selectors: HashSet<String>,
    frames: Vec<HashSet<String>>,
    failing_labels: HashSet<String>,
    hanging_labels: HashSet<String>,
    stuck_in_frames: bool,
    current_frame: Mutex<Option<usize>>,
    text_queries: AtomicUsize,
    selector_queries: AtomicUsize,
    text_calls: AtomicUsize,
    selector_calls: AtomicUsize,
    top_frame_calls: AtomicUsize,
    entered: Mutex<Vec<usize>>,
    clicked: Mutex<Vec<String>>,
}

impl MockPage {
    fn with_texts(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    fn visible(&self) -> HashSet<String> {
        match *self.current_frame.lock().unwrap() {
            None => self.texts.clone(),
            Some(index) => self.frames[index].clone(),
        }
    }
}

#[async_trait]
impl LivePage for MockPage {
    async fn visible_texts(&self, labels: &[String]) -> Result<Vec<String>, PageError> {
        self.text_queries.fetch_add(1, Ordering::SeqCst);
        let visible = self.visible();
        Ok(labels.iter().filter(|l| visible.contains(*l)).cloned().collect())
    }

    async fn matching_selectors(&self, selectors: &[String]) -> Result<Vec<String>, PageError> {
        self.selector_queries.fetch_add(1, Ordering::SeqCst);
        Ok(selectors
            .iter()
            .filter(|s| self.selectors.contains(*s))
            .cloned()
            .collect())
    }

    async fn click_by_text(&self, text: &str, _timeout: Duration) -> Result<(), PageError> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_labels.contains(text) {
            return Err(PageError::Driver("element not interactable".to_string()));
        }
        if self.hanging_labels.contains(text) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        if self.visible().contains(text) {
            self.clicked.lock().unwrap().push(text.to_string());
            Ok(())
        } else {
            Err(PageError::NotFound(text.to_string()))
        }
    }

    async fn click_by_selector(&self, selector: &str, _timeout: Duration) -> Result<(), PageError> {
        self.selector_calls.fetch_add(1, Ordering::SeqCst);
        if self.selectors.contains(selector) {
            self.clicked.lock().unwrap().push(selector.to_string());
            Ok(())
        } else {
            Err(PageError::NotFound(selector.to_string()))
        }
    }

    async fn frame_count(&self) -> Result<usize, PageError> {
        Ok(self.frames.len())
    }

    async fn enter_frame(&self, index: usize) -> Result<(), PageError> {
        if index >= self.frames.len() {
            return Err(PageError::NoSuchFrame(index));
        }
        self.entered.lock().unwrap().push(index);
        *self.current_frame.lock().unwrap() = Some(index);
        Ok(())
    }

    async fn leave_frame(&self) -> Result<(), PageError> {
        if self.stuck_in_frames {
            return Err(PageError::Driver("no such window".to_string()));
        }
        *self.current_frame.lock().unwrap() = None;
        Ok(())
    }

    async fn top_frame(&self) -> Result<(), PageError> {
        self.top_frame_calls.fetch_add(1, Ordering::SeqCst);
        *self.current_frame.lock().unwrap() = None;
        Ok(())
    }
}

/// Page without any dialog where every driver call takes as long as it is
/// allowed to
struct SlowEmptyPage {
    frames: usize,
}

impl SlowEmptyPage {
    async fn stall() {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
}

#[async_trait]
impl LivePage for SlowEmptyPage {
    async fn visible_texts(&self, _labels: &[String]) -> Result<Vec<String>, PageError> {
        Self::stall().await;
        Ok(Vec::new())
    }

    async fn matching_selectors(&self, _selectors: &[String]) -> Result<Vec<String>, PageError> {
        Self::stall().await;
        Ok(Vec::new())
    }

    async fn click_by_text(&self, text: &str, timeout: Duration) -> Result<(), PageError> {
        tokio::time::sleep(timeout).await;
        Err(PageError::NotFound(text.to_string()))
    }

    async fn click_by_selector(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        tokio::time::sleep(timeout).await;
        Err(PageError::NotFound(selector.to_string()))
    }

    async fn frame_count(&self) -> Result<usize, PageError> {
        Ok(self.frames)
    }

    async fn enter_frame(&self, _index: usize) -> Result<(), PageError> {
        Ok(())
    }

    async fn leave_frame(&self) -> Result<(), PageError> {
        Ok(())
    }

    async fn top_frame(&self) -> Result<(), PageError> {
        Ok(())
    }
}

/// Wraps a strategy and counts how often it is entered
struct Counting {
    inner: Box<dyn DialogStrategy>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl DialogStrategy for Counting {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn attempt(&self, page: &dyn LivePage) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.attempt(page).await
    }
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn fast() -> Duration {
    Duration::from_millis(50)
}

#[tokio::test]
async fn test_text_match_wins_over_selector() {
    let mut page = MockPage::with_texts(&["Accept All"]);
    page.selectors.insert("#onetrust-accept-btn-handler".to_string());

    let selector_calls = Arc::new(AtomicUsize::new(0));
    let text = TextMatchStrategy::new(labels(CONSENT_LABELS), fast(), Duration::ZERO);
    let resolver = CookieDialogResolver::with_strategies(
        Duration::ZERO,
        vec![
            Box::new(text.clone()),
            Box::new(Counting {
                inner: Box::new(SelectorStrategy::new(
                    labels(CONSENT_SELECTORS),
                    fast(),
                    Duration::ZERO,
                )),
                calls: Arc::clone(&selector_calls),
            }),
            Box::new(FrameScopedStrategy::new(text, fast())),
        ],
    );

    assert!(resolver.resolve(&page).await);
    assert_eq!(selector_calls.load(Ordering::SeqCst), 0);
    assert_eq!(page.selector_queries.load(Ordering::SeqCst), 0);
    assert_eq!(page.selector_calls.load(Ordering::SeqCst), 0);
    assert_eq!(*page.clicked.lock().unwrap(), vec!["Accept All".to_string()]);
}

#[tokio::test]
async fn test_label_priority_order() {
    let page = MockPage::with_texts(&["OK", "Accept"]);
    let resolver = CookieDialogResolver::from_config(&DialogConfig::immediate());

    assert!(resolver.resolve(&page).await);
    // "Accept" is earlier in the priority list than "OK"
    assert_eq!(*page.clicked.lock().unwrap(), vec!["Accept".to_string()]);
}

#[tokio::test]
async fn test_labels_found_with_one_query() {
    let page = MockPage::default();
    let strategy = TextMatchStrategy::new(labels(CONSENT_LABELS), fast(), Duration::ZERO);

    assert!(!strategy.attempt(&page).await);
    assert_eq!(page.text_queries.load(Ordering::SeqCst), 1);
    // Nothing present, so nothing is waited on
    assert_eq!(page.text_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_selector_fallback() {
    let mut page = MockPage::default();
    page.selectors.insert("#didomi-notice-agree-button".to_string());
    let resolver = CookieDialogResolver::from_config(&DialogConfig::immediate());

    assert!(resolver.resolve(&page).await);
    assert_eq!(page.text_queries.load(Ordering::SeqCst), 1);
    assert_eq!(page.selector_queries.load(Ordering::SeqCst), 1);
    assert_eq!(
        *page.clicked.lock().unwrap(),
        vec!["#didomi-notice-agree-button".to_string()]
    );
}

#[tokio::test]
async fn test_frame_scoped_retry() {
    let mut page = MockPage::default();
    page.frames.push(HashSet::new());
    page.frames.push(["Tout accepter".to_string()].into_iter().collect());
    let resolver = CookieDialogResolver::from_config(&DialogConfig::immediate());

    assert!(resolver.resolve(&page).await);
    assert_eq!(*page.clicked.lock().unwrap(), vec!["Tout accepter".to_string()]);
    // Back in the top-level context afterwards
    assert_eq!(*page.current_frame.lock().unwrap(), None);
}

#[tokio::test]
async fn test_frame_walk_stops_when_parent_is_lost() {
    let mut page = MockPage::default();
    page.frames.push(HashSet::new());
    page.frames.push(["Accept".to_string()].into_iter().collect());
    page.stuck_in_frames = true;
    let strategy = FrameScopedStrategy::new(
        TextMatchStrategy::new(labels(CONSENT_LABELS), fast(), Duration::ZERO),
        fast(),
    );

    assert!(!strategy.attempt(&page).await);
    // Frame 1 is never entered from inside frame 0
    assert_eq!(*page.entered.lock().unwrap(), vec![0]);
    assert_eq!(page.top_frame_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*page.current_frame.lock().unwrap(), None);
}

#[tokio::test]
async fn test_no_dialog_is_not_an_error() {
    let page = MockPage::default();
    let resolver = CookieDialogResolver::from_config(&DialogConfig::immediate());

    assert!(!resolver.resolve(&page).await);
    assert!(page.clicked.lock().unwrap().is_empty());
    assert_eq!(page.selector_calls.load(Ordering::SeqCst), 0);
    assert_eq!(page.text_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failing_attempt_moves_to_next_label() {
    let mut page = MockPage::with_texts(&["Accept all", "Agree"]);
    page.failing_labels.insert("Accept all".to_string());
    let strategy = TextMatchStrategy::new(labels(&["Accept all", "Agree"]), fast(), Duration::ZERO);

    assert!(strategy.attempt(&page).await);
    assert_eq!(*page.clicked.lock().unwrap(), vec!["Agree".to_string()]);
}

#[tokio::test]
async fn test_hanging_attempt_is_bounded() {
    let mut page = MockPage::with_texts(&["Accept", "Agree"]);
    page.hanging_labels.insert("Accept".to_string());
    let strategy = TextMatchStrategy::new(labels(&["Accept", "Agree"]), fast(), Duration::ZERO);

    let started = std::time::Instant::now();
    assert!(strategy.attempt(&page).await);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(*page.clicked.lock().unwrap(), vec!["Agree".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_page_without_dialog_fits_default_timing() {
    let config = ScrapeConfig::default();
    let browser = &config.browser;
    let page = SlowEmptyPage { frames: 1 };
    let resolver = CookieDialogResolver::from_config(&config.dialog);

    let started = tokio::time::Instant::now();
    let handled = resolver.resolve(&page).await;
    let elapsed = started.elapsed();

    assert!(!handled);
    assert!(elapsed <= config.dialog.budget());
    // Worst-case navigation, dialog handling, settling and the snapshot all
    // fit inside the page deadline
    assert!(
        browser.navigation_timeout() + elapsed + browser.settle_delay() + SNAPSHOT_RESERVE
            <= browser.total_timeout()
    );
}

#[tokio::test(start_paused = true)]
async fn test_budget_cuts_off_a_long_chain() {
    // Every label looks present but no click ever lands
    let mut page = MockPage::with_texts(CONSENT_LABELS);
    page.hanging_labels = page.texts.clone();
    page.frames.push(HashSet::new());
    let config = DialogConfig::default();
    let budget = Duration::from_millis(4_200);
    let resolver = CookieDialogResolver::from_config(&config).with_budget(budget);
    assert_eq!(resolver.budget(), Some(budget));

    let started = tokio::time::Instant::now();
    assert!(!resolver.resolve(&page).await);
    let elapsed = started.elapsed();

    assert!(elapsed >= budget);
    assert!(elapsed < budget + Duration::from_secs(1));
    assert!(page.text_calls.load(Ordering::SeqCst) < CONSENT_LABELS.len());
    assert_eq!(page.top_frame_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*page.current_frame.lock().unwrap(), None);
}

#[tokio::test]
async fn test_extra_configured_labels_and_selectors() {
    let mut config = DialogConfig::immediate();
    config.labels.push("Zustimmen und weiter".to_string());
    config.selectors.push("#my-consent".to_string());
    let resolver = CookieDialogResolver::from_config(&config);
    assert_eq!(
        resolver.strategy_names(),
        vec!["text-match", "selector", "frame-text-match"]
    );

    let page = MockPage::with_texts(&["Zustimmen und weiter"]);
    assert!(resolver.resolve(&page).await);

    let mut page = MockPage::default();
    page.selectors.insert("#my-consent".to_string());
    assert!(resolver.resolve(&page).await);
}
