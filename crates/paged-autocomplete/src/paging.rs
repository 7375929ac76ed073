//! Paging Math Module
//!
//! Pure functions for page bookkeeping and the scroll prefetch trigger.

// ============================================================================
// Core Formulas
// ============================================================================

/// Page number reached by `accumulated` results: `ceil(accumulated / page_size)`, at least 1
pub fn page_for_len(accumulated: usize, page_size: usize) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = accumulated.div_ceil(page_size);
    (pages.max(1)).min(u32::MAX as usize) as u32
}

/// A full page means the endpoint may hold more results
pub fn has_more_pages(page_len: usize, page_size: usize) -> bool {
    page_size > 0 && page_len == page_size
}

/// Pixels left below the visible part of the list
pub fn distance_from_bottom(metrics: &ScrollMetrics) -> f64 {
    metrics.scroll_height - (metrics.scroll_top + metrics.client_height)
}

// ============================================================================
// Trigger Logic
// ============================================================================

/// Scroll position of the dropdown list, as reported by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }
}

/// Result of checking whether a scroll event should prefetch the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCheck {
    /// Nothing to do
    None,
    /// Request the given page
    Fetch(u32),
}

/// Check if a scroll event should schedule the next page
pub fn check_trigger(
    metrics: &ScrollMetrics,
    threshold_px: f64,
    current_page: u32,
    loading: bool,
    has_more_pages: bool,
) -> TriggerCheck {
    if loading || !has_more_pages {
        return TriggerCheck::None;
    }
    if distance_from_bottom(metrics) < threshold_px {
        TriggerCheck::Fetch(current_page.saturating_add(1))
    } else {
        TriggerCheck::None
    }
}
