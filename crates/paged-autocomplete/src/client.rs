//! Search endpoint contract
//!
//! The controller only talks to the endpoint through [`SearchClient`]. Anything
//! that can turn `(query, page, token)` into a page of [`SearchResult`]s or a
//! classified [`FetchError`] can back a controller: the bundled HTTP client,
//! an in-process index, or a scripted test double.

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use crate::token::RequestToken;
use crate::SearchResult;

// ============================================================================
// Request / Failure Types
// ============================================================================

/// One page of one query
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub query: String,
    /// 1-based
    pub page: u32,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(query: impl Into<String>, page: u32, page_size: usize) -> Self {
        Self {
            query: query.into(),
            page: page.max(1),
            page_size,
        }
    }
}

/// Classification of a failed fetch, without diagnostic detail
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// HTTP 5xx
    ServerError,
    /// HTTP 404
    NotFound,
    /// HTTP 400
    BadRequest,
    /// Any other non-success status
    RequestFailed,
    /// Transport failure (connect, timeout, reset)
    NetworkError,
    /// Payload failed validation
    InvalidResponse,
    /// Aborted by the caller; never shown to the user
    Cancelled,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("server error (HTTP {0})")]
    ServerError(u16),

    #[error("not found")]
    NotFound,

    #[error("bad request")]
    BadRequest,

    #[error("request failed (HTTP {0})")]
    RequestFailed(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Map a non-success HTTP status to its failure
    pub fn from_status(status: u16) -> Self {
        match status {
            s if s >= 500 => FetchError::ServerError(s),
            404 => FetchError::NotFound,
            400 => FetchError::BadRequest,
            _ => FetchError::RequestFailed(status),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::ServerError(_) => ErrorKind::ServerError,
            FetchError::NotFound => ErrorKind::NotFound,
            FetchError::BadRequest => ErrorKind::BadRequest,
            FetchError::RequestFailed(_) => ErrorKind::RequestFailed,
            FetchError::Network(_) => ErrorKind::NetworkError,
            FetchError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            FetchError::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}

// ============================================================================
// Client Trait
// ============================================================================

/// Source of result pages for the controller
///
/// Implementations should stop work once `token` is cancelled and return
/// [`FetchError::Cancelled`]; the controller ignores late results either way.
pub trait SearchClient: Send + Sync + 'static {
    fn fetch_page(
        &self,
        request: PageRequest,
        token: RequestToken,
    ) -> impl Future<Output = Result<Vec<SearchResult>, FetchError>> + Send;
}

impl<T: SearchClient> SearchClient for std::sync::Arc<T> {
    fn fetch_page(
        &self,
        request: PageRequest,
        token: RequestToken,
    ) -> impl Future<Output = Result<Vec<SearchResult>, FetchError>> + Send {
        (**self).fetch_page(request, token)
    }
}

// ============================================================================
// Payload Validation
// ============================================================================

#[derive(Deserialize)]
struct RawResult {
    id: i64,
    label: String,
}

/// Validate an endpoint payload: an array of `{ id: integer >= 1, label: non-empty string }`.
/// Unknown fields are ignored.
pub fn parse_results(payload: serde_json::Value) -> Result<Vec<SearchResult>, FetchError> {
    let raw: Vec<RawResult> = serde_json::from_value(payload)
        .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
    raw.into_iter()
        .enumerate()
        .map(|(index, item)| {
            if item.id < 1 {
                return Err(FetchError::InvalidResponse(format!(
                    "item {index}: id {} is below 1",
                    item.id
                )));
            }
            if item.label.is_empty() {
                return Err(FetchError::InvalidResponse(format!("item {index}: empty label")));
            }
            Ok(SearchResult {
                id: item.id as u64,
                label: item.label,
            })
        })
        .collect()
}

/// Validate a raw response body
pub fn parse_body(body: &[u8]) -> Result<Vec<SearchResult>, FetchError> {
    let payload: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
    parse_results(payload)
}
