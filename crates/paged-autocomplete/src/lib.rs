//! Paged Autocomplete - debounced, cancel-safe, cached search controller
//!
//! [`SearchController`] backs a searchable dropdown: keystrokes are debounced
//! into page-1 requests, scrolling near the bottom of the list fetches the next
//! page, and every query's accumulated pages are cached for the session so
//! revisiting a query never touches the network. The controller publishes a
//! [`SearchState`] signal for the renderer to observe.

pub mod cache;
pub mod client;
pub mod config;
mod controller;
pub mod debounce;
#[cfg(feature = "http")]
pub mod http;
pub mod messages;
pub mod paging;
pub mod token;
pub mod view;

use serde::{Deserialize, Serialize};

// Re-export key types
pub use client::{ErrorKind, FetchError, PageRequest, SearchClient};
pub use config::SearchConfig;
pub use controller::SearchController;
#[cfg(feature = "http")]
pub use http::HttpSearchClient;
pub use messages::{Locale, Messages};
pub use paging::ScrollMetrics;
pub use token::RequestToken;
pub use view::{ListBody, ListFooter, ListView};
pub use ankurah_signals;

// ============================================================================
// Core Types
// ============================================================================

/// One selectable option returned by the search endpoint
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    /// Unique, at least 1
    pub id: u64,
    /// Never empty
    pub label: String,
}

impl SearchResult {
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// Where the controller is in its request cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Waiting out the keystroke quiet period
    Debouncing,
    /// A request is in flight
    Loading,
    /// Options reflect the last successful fetch or a cache hit
    Loaded,
    /// The last request failed; see [`SearchState::error`]
    Errored,
}

/// A surfaced fetch failure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestFailure {
    pub kind: ErrorKind,
    /// Page that failed; retrying requests this page again
    pub page: u32,
    /// Localized text for display
    pub message: String,
}

/// The state exposed to the renderer
#[derive(Clone, Debug, PartialEq)]
pub struct SearchState {
    /// Text in the input box
    pub input: String,
    /// Options to display, in fetch order
    pub options: Vec<SearchResult>,
    pub loading: bool,
    pub has_more_pages: bool,
    pub phase: Phase,
    pub error: Option<RequestFailure>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            input: String::new(),
            options: Vec::new(),
            loading: false,
            has_more_pages: true,
            phase: Phase::Idle,
            error: None,
        }
    }
}

impl SearchState {
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn labels(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.label.as_str()).collect()
    }
}
