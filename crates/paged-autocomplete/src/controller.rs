//! Search controller state machine
//!
//! All transitions run under one lock and publish the resulting [`SearchState`]
//! before releasing it. Every request carries a [`RequestToken`]; a resolution
//! is applied only while its token is still the active one. Every input change
//! advances an epoch, and debounced work scheduled under an older epoch is
//! dropped when it fires.

use std::sync::Arc;

use ankurah_signals::{Mut, Peek, Read};
use parking_lot::Mutex;

use crate::cache::{CacheEntry, QueryCache};
use crate::client::{FetchError, PageRequest, SearchClient};
use crate::config::SearchConfig;
use crate::debounce::Debouncer;
use crate::messages::Messages;
use crate::paging::{self, ScrollMetrics, TriggerCheck};
use crate::token::RequestToken;
use crate::view::ListView;
use crate::{Phase, RequestFailure, SearchResult, SearchState};

/// Debounced, cancel-safe, cached pagination controller for one autocomplete widget
///
/// Event handlers are synchronous and spawn their network work, so they must be
/// called from within a tokio runtime. Listeners on [`state`](Self::state) must
/// not call back into the controller synchronously.
///
/// Dropping the controller disposes it.
pub struct SearchController<C: SearchClient> {
    inner: Arc<Inner<C>>,
}

struct Inner<C: SearchClient> {
    client: C,
    config: SearchConfig,
    messages: &'static Messages,
    state: Mut<SearchState>,
    core: Mutex<Core>,
    query_debounce: Debouncer,
    scroll_debounce: Debouncer,
}

struct Core {
    /// Working copy of the published state
    state: SearchState,
    cache: QueryCache,
    /// Page the displayed options reach, `ceil(len / page_size)`
    page: u32,
    active: Option<RequestToken>,
    next_request_id: u64,
    epoch: u64,
    disposed: bool,
}

impl<C: SearchClient> SearchController<C> {
    pub fn new(client: C, config: SearchConfig) -> Self {
        let messages = Messages::for_locale(config.locale);
        let query_debounce = Debouncer::new("query", config.query_debounce());
        let scroll_debounce = Debouncer::new("scroll", config.scroll_debounce());

        Self {
            inner: Arc::new(Inner {
                client,
                config,
                messages,
                state: Mut::new(SearchState::default()),
                core: Mutex::new(Core {
                    state: SearchState::default(),
                    cache: QueryCache::new(),
                    page: 1,
                    active: None,
                    next_request_id: 0,
                    epoch: 0,
                    disposed: false,
                }),
                query_debounce,
                scroll_debounce,
            }),
        }
    }

    // Accessors
    pub fn state(&self) -> Read<SearchState> {
        self.inner.state.read()
    }

    pub fn snapshot(&self) -> SearchState {
        self.inner.state.peek()
    }

    pub fn view(&self) -> ListView {
        ListView::from_state(&self.snapshot(), self.inner.messages)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.inner.config
    }

    pub fn current_page(&self) -> u32 {
        self.inner.core.lock().page
    }

    pub fn cached_queries(&self) -> Vec<String> {
        self.inner.core.lock().cache.queries()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.core.lock().disposed
    }

    /// The input text changed
    ///
    /// A cached query is adopted synchronously. Otherwise the list is cleared and
    /// page 1 is fetched once the input has been quiet for the debounce period.
    pub fn on_input_change(&self, text: impl Into<String>) {
        let text = text.into();
        let inner = &self.inner;
        let mut core = inner.core.lock();
        if core.disposed {
            return;
        }

        core.epoch += 1;
        let epoch = core.epoch;
        core.cancel_active();
        inner.scroll_debounce.cancel();
        core.state.input = text.clone();
        core.state.error = None;

        if inner.apply_cache(&mut core, &text) {
            inner.query_debounce.cancel();
            tracing::debug!("input {:?}: cache hit ({} options)", text, core.state.options.len());
            inner.publish(&core);
            return;
        }

        core.state.options.clear();
        core.page = 1;
        core.state.loading = true;
        core.state.phase = Phase::Debouncing;
        inner.publish(&core);
        drop(core);

        tracing::debug!("input {:?}: cache miss, debouncing", text);
        inner.schedule_query_fetch(text, epoch);
    }

    /// The dropdown list was opened
    pub fn on_dropdown_open(&self) {
        let inner = &self.inner;
        let mut core = inner.core.lock();
        if core.disposed || core.active.is_some() {
            return;
        }

        let input = core.state.input.clone();
        if inner.apply_cache(&mut core, &input) {
            inner.query_debounce.cancel();
            inner.publish(&core);
            return;
        }
        if !core.state.options.is_empty() {
            return;
        }

        // Fetch now rather than after the pending keystroke debounce, if any
        inner.query_debounce.cancel();
        let token = inner.begin_request(&mut core, &input, 1);
        drop(core);
        inner.launch(input, 1, token);
    }

    /// The dropdown list was scrolled
    ///
    /// Near the bottom of the list, schedules the next page after the scroll
    /// quiet period. Loading and exhaustion are checked again when it fires.
    pub fn on_list_scroll(&self, metrics: ScrollMetrics) {
        let inner = &self.inner;
        let (epoch, trigger) = {
            let core = inner.core.lock();
            if core.disposed || core.state.options.is_empty() {
                return;
            }
            let trigger = paging::check_trigger(
                &metrics,
                inner.config.scroll_threshold_px,
                core.page,
                core.state.loading,
                core.state.has_more_pages,
            );
            (core.epoch, trigger)
        };

        if let TriggerCheck::Fetch(page) = trigger {
            tracing::trace!(
                "scroll: {}px from bottom, scheduling page {}",
                paging::distance_from_bottom(&metrics),
                page
            );
            let weak = Arc::downgrade(inner);
            inner.scroll_debounce.schedule(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.fetch_next_page(epoch);
                }
            });
        }
    }

    /// Fetch `page` of `query` now, and wait for it to resolve or be superseded
    ///
    /// `query` becomes the input text and pending debounced fetches are dropped.
    /// `page` is clamped so the cached list for `query` never gets a gap: page 1
    /// without a cache entry, otherwise at most one page past what is cached.
    pub async fn fetch_page(&self, query: &str, page: u32) {
        let inner = &self.inner;
        let (page, token) = {
            let mut core = inner.core.lock();
            if core.disposed {
                return;
            }

            core.epoch += 1;
            inner.query_debounce.cancel();
            inner.scroll_debounce.cancel();
            if core.state.input != query {
                core.state.input = query.to_string();
                if !inner.apply_cache(&mut core, query) {
                    core.state.options.clear();
                    core.page = 1;
                }
            }

            let page = page.clamp(1, inner.last_fetchable_page(&core, query));
            (page, inner.begin_request(&mut core, query, page))
        };
        inner.run_request(query.to_string(), page, token).await;
    }

    /// Re-issue the request that failed: same query, same page
    pub fn retry(&self) {
        let inner = &self.inner;
        let mut core = inner.core.lock();
        if core.disposed {
            return;
        }
        let Some(failure) = core.state.error.clone() else {
            return;
        };

        let input = core.state.input.clone();
        tracing::debug!("retrying page {} of {:?}", failure.page, input);
        inner.query_debounce.cancel();
        let token = inner.begin_request(&mut core, &input, failure.page);
        drop(core);
        inner.launch(input, failure.page, token);
    }

    /// Cancel the active request and pending timers. Nothing touches the state afterwards.
    pub fn dispose(&self) {
        let inner = &self.inner;
        {
            let mut core = inner.core.lock();
            if core.disposed {
                return;
            }
            core.disposed = true;
            core.cancel_active();
        }
        inner.query_debounce.cancel();
        inner.scroll_debounce.cancel();
        tracing::debug!("search controller disposed");
    }
}

impl<C: SearchClient> Drop for SearchController<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Core {
    fn cancel_active(&mut self) {
        if let Some(token) = self.active.take() {
            tracing::debug!("cancelling request {}", token.id());
            token.cancel();
        }
    }
}

impl<C: SearchClient> Inner<C> {
    fn publish(&self, core: &Core) {
        self.state.set(core.state.clone());
    }

    /// Adopt the cache entry for `query`, if there is one
    fn apply_cache(&self, core: &mut Core, query: &str) -> bool {
        let Some(entry) = core.cache.get(query) else {
            return false;
        };
        let options = entry.results.clone();
        let has_more_pages = entry.has_more_pages;
        core.page = entry.page(self.config.page_size);

        core.state.options = options;
        core.state.has_more_pages = has_more_pages;
        core.state.loading = false;
        core.state.error = None;
        core.state.phase = Phase::Loaded;
        true
    }

    /// Highest page of `query` that extends its cache entry without a gap
    fn last_fetchable_page(&self, core: &Core, query: &str) -> u32 {
        match core.cache.get(query) {
            Some(entry) if entry.has_more_pages => {
                entry.page(self.config.page_size).saturating_add(1)
            }
            Some(entry) => entry.page(self.config.page_size),
            None => 1,
        }
    }

    /// Make a fresh token the only active one and publish the loading state
    fn begin_request(&self, core: &mut Core, query: &str, page: u32) -> RequestToken {
        core.cancel_active();
        core.next_request_id += 1;
        let token = RequestToken::new(core.next_request_id);
        core.active = Some(token.clone());

        core.state.loading = true;
        core.state.error = None;
        core.state.phase = Phase::Loading;
        self.publish(core);

        tracing::debug!("request {}: page {} of {:?}", token.id(), page, query);
        token
    }

    fn launch(self: &Arc<Self>, query: String, page: u32, token: RequestToken) {
        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.run_request(query, page, token).await });
    }

    fn schedule_query_fetch(self: &Arc<Self>, query: String, epoch: u64) {
        let weak = Arc::downgrade(self);
        self.query_debounce.schedule(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let token = {
                let mut core = inner.core.lock();
                if core.disposed || core.epoch != epoch {
                    tracing::debug!("dropping stale debounced fetch for {:?}", query);
                    return;
                }
                inner.begin_request(&mut core, &query, 1)
            };
            inner.launch(query, 1, token);
        });
    }

    fn fetch_next_page(self: &Arc<Self>, epoch: u64) {
        let mut core = self.core.lock();
        if core.disposed
            || core.epoch != epoch
            || core.state.loading
            || !core.state.has_more_pages
            || core.state.options.is_empty()
        {
            return;
        }
        let query = core.state.input.clone();
        let page = core.page.saturating_add(1);
        let token = self.begin_request(&mut core, &query, page);
        drop(core);
        self.launch(query, page, token);
    }

    async fn run_request(&self, query: String, page: u32, token: RequestToken) {
        let request = PageRequest::new(query.clone(), page, self.config.page_size);
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(FetchError::Cancelled),
            result = self.client.fetch_page(request, token.clone()) => result,
        };
        self.finish_request(&query, page, &token, result);
    }

    fn finish_request(
        &self,
        query: &str,
        page: u32,
        token: &RequestToken,
        result: Result<Vec<SearchResult>, FetchError>,
    ) {
        let mut core = self.core.lock();
        let is_active = core.active.as_ref().is_some_and(|active| active.id() == token.id());
        if core.disposed || !is_active || token.is_cancelled() {
            tracing::debug!("request {}: discarding superseded response", token.id());
            return;
        }
        core.active = None;

        match result {
            Err(error) if error.is_cancelled() => {
                // The client gave up on its own; nothing to show
                core.state.loading = false;
                core.state.phase = if core.state.options.is_empty() {
                    Phase::Idle
                } else {
                    Phase::Loaded
                };
            }
            Err(error) => {
                tracing::warn!("request {}: page {} of {:?} failed: {}", token.id(), page, query, error);
                let kind = error.kind();
                if page == 1 {
                    core.state.options.clear();
                }
                core.state.loading = false;
                core.state.phase = Phase::Errored;
                core.state.error = Some(RequestFailure {
                    kind,
                    page,
                    message: self.messages.error(kind).to_string(),
                });
            }
            Ok(results) => {
                let page_size = self.config.page_size;
                let has_more_pages = paging::has_more_pages(results.len(), page_size);
                let received = results.len();
                let merged = if page == 1 {
                    results
                } else {
                    let mut merged = core
                        .cache
                        .get(query)
                        .map(|entry| entry.results.clone())
                        .unwrap_or_default();
                    // A refetched page replaces itself and whatever followed it
                    merged.truncate((page as usize - 1) * page_size);
                    merged.extend(results);
                    merged
                };

                tracing::debug!(
                    "request {}: page {} of {:?} returned {} ({} total, more: {})",
                    token.id(),
                    page,
                    query,
                    received,
                    merged.len(),
                    has_more_pages
                );

                core.cache.insert(
                    query,
                    CacheEntry {
                        results: merged.clone(),
                        has_more_pages,
                    },
                );
                core.page = paging::page_for_len(merged.len(), page_size);
                core.state.options = merged;
                core.state.has_more_pages = has_more_pages;
                core.state.loading = false;
                core.state.error = None;
                core.state.phase = Phase::Loaded;
            }
        }
        self.publish(&core);
    }
}
