//! Test utilities for paged-autocomplete integration tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::Level;

pub use ankurah_signals::Subscribe;
pub use paged_autocomplete::{
    ErrorKind, FetchError, ListBody, ListFooter, Locale, PageRequest, Phase, RequestToken,
    ScrollMetrics, SearchClient, SearchConfig, SearchController, SearchResult, SearchState,
};

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_test_writer()
        .try_init();
}

pub const DEBOUNCE: Duration = Duration::from_millis(500);
pub const SCROLL_DEBOUNCE: Duration = Duration::from_millis(300);

/// Standard test configuration: 20 per page, 500ms keystroke debounce, 50px threshold
pub fn test_config() -> SearchConfig {
    SearchConfig::default()
        .with_page_size(20)
        .with_query_debounce(DEBOUNCE)
        .with_scroll_threshold_px(50.0)
}

/// `n` films labelled "{title} 1" .. "{title} n", ids starting at `first_id`
pub fn films(title: &str, first_id: u64, n: u64) -> Vec<SearchResult> {
    (0..n)
        .map(|i| SearchResult::new(first_id + i, format!("{title} {}", i + 1)))
        .collect()
}

/// 25 "Batman" films (ids 1-25) and 12 "Alien" films (ids 101-112)
pub fn standard_catalog() -> Vec<SearchResult> {
    let mut catalog = films("Batman", 1, 25);
    catalog.extend(films("Alien", 101, 12));
    catalog
}

pub fn ids(state: &SearchState) -> Vec<u64> {
    state.options.iter().map(|o| o.id).collect()
}

/// Metrics for a list scrolled to within `px` of its bottom
pub fn near_bottom(px: f64) -> ScrollMetrics {
    ScrollMetrics::new(1000.0 - 300.0 - px, 1000.0, 300.0)
}

/// Let spawned tasks run without moving far along the paused clock
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

// ============================================================================
// MockSearchClient
// ============================================================================

/// In-memory search endpoint with json-server semantics.
///
/// Filters the catalogue by case-insensitive label substring and paginates it.
/// Records every request, can fail scripted requests, and in hold mode parks
/// each request until the test releases it.
#[derive(Clone)]
pub struct MockSearchClient {
    inner: Arc<MockState>,
}

struct MockState {
    catalog: Vec<SearchResult>,
    calls: Mutex<Vec<PageRequest>>,
    failures: Mutex<HashMap<(String, u32), VecDeque<FetchError>>>,
    hold: AtomicBool,
    ignore_cancellation: AtomicBool,
    gates: Mutex<Vec<Option<oneshot::Sender<()>>>>,
}

impl MockSearchClient {
    pub fn new(catalog: Vec<SearchResult>) -> Self {
        Self {
            inner: Arc::new(MockState {
                catalog,
                calls: Mutex::new(Vec::new()),
                failures: Mutex::new(HashMap::new()),
                hold: AtomicBool::new(false),
                ignore_cancellation: AtomicBool::new(false),
                gates: Mutex::new(Vec::new()),
            }),
        }
    }

    /// `(query, page)` of every request so far, in order
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.inner
            .calls
            .lock()
            .iter()
            .map(|r| (r.query.clone(), r.page))
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().len()
    }

    /// The next request for `(query, page)` fails with `error`
    pub fn fail_next(&self, query: &str, page: u32, error: FetchError) {
        self.inner
            .failures
            .lock()
            .entry((query.to_string(), page))
            .or_default()
            .push_back(error);
    }

    /// Park subsequent requests until released
    pub fn hold(&self) {
        self.inner.hold.store(true, Ordering::SeqCst);
    }

    /// Answer parked requests as soon as they are released, even if cancelled
    pub fn ignore_cancellation(&self) {
        self.inner.ignore_cancellation.store(true, Ordering::SeqCst);
    }

    /// Release the parked request with the given call index
    pub fn release(&self, call: usize) {
        if let Some(Some(gate)) = self.inner.gates.lock().get_mut(call).map(Option::take) {
            let _ = gate.send(());
        }
    }

    fn respond(&self, request: &PageRequest) -> Result<Vec<SearchResult>, FetchError> {
        if let Some(error) = self
            .inner
            .failures
            .lock()
            .get_mut(&(request.query.clone(), request.page))
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        let needle = request.query.to_lowercase();
        let skip = (request.page as usize - 1) * request.page_size;
        Ok(self
            .inner
            .catalog
            .iter()
            .filter(|item| item.label.to_lowercase().contains(&needle))
            .skip(skip)
            .take(request.page_size)
            .cloned()
            .collect())
    }
}

impl SearchClient for MockSearchClient {
    fn fetch_page(
        &self,
        request: PageRequest,
        token: RequestToken,
    ) -> impl Future<Output = Result<Vec<SearchResult>, FetchError>> + Send {
        let this = self.clone();
        async move {
            let gate = {
                let mut calls = this.inner.calls.lock();
                calls.push(request.clone());
                let mut gates = this.inner.gates.lock();
                if this.inner.hold.load(Ordering::SeqCst) {
                    let (tx, rx) = oneshot::channel();
                    gates.push(Some(tx));
                    Some(rx)
                } else {
                    gates.push(None);
                    None
                }
            };

            match gate {
                Some(gate) if this.inner.ignore_cancellation.load(Ordering::SeqCst) => {
                    let _ = gate.await;
                }
                Some(gate) => {
                    tokio::select! {
                        _ = token.cancelled() => return Err(FetchError::Cancelled),
                        _ = gate => {}
                    }
                }
                None => tokio::task::yield_now().await,
            }
            this.respond(&request)
        }
    }
}

// ============================================================================
// MockRenderer
// ============================================================================

/// Simulates a widget consuming SearchState updates from the controller.
pub struct MockRenderer {
    rx: mpsc::UnboundedReceiver<SearchState>,
    _guard: ankurah_signals::SubscriptionGuard,
}

impl MockRenderer {
    pub fn new<C: SearchClient>(controller: &SearchController<C>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let guard = controller.state().subscribe(move |state: SearchState| {
            let _ = tx.send(state);
        });
        Self { rx, _guard: guard }
    }

    /// Wait for the next render, panicking if none arrives within `within`
    pub async fn next_render(&mut self, within: Duration) -> SearchState {
        match tokio::time::timeout(within, self.rx.recv()).await {
            Ok(Some(state)) => state,
            Ok(None) => panic!("channel closed"),
            Err(_) => panic!("expected render did not arrive within {within:?}"),
        }
    }

    /// Wait for a render matching `predicate`, skipping intermediate ones
    pub async fn render_where(
        &mut self,
        within: Duration,
        predicate: impl Fn(&SearchState) -> bool,
    ) -> SearchState {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let state = self.next_render(remaining).await;
            if predicate(&state) {
                return state;
            }
        }
    }

    /// Assert that nothing renders for `within`
    pub async fn no_render(&mut self, within: Duration) {
        if let Ok(Some(state)) = tokio::time::timeout(within, self.rx.recv()).await {
            panic!("unexpected render received: {state:?}");
        }
    }
}
