//! Render model for the dropdown list
//!
//! Turns a [`SearchState`] into what a widget needs to draw: the list body and
//! what goes below the last option.

use crate::messages::Messages;
use crate::{SearchResult, SearchState};

/// Main area of the dropdown
#[derive(Clone, Debug, PartialEq)]
pub enum ListBody {
    /// No options yet, a request is pending
    Loading { text: &'static str },
    /// The page-1 request failed; the retry affordance replaces the list
    Failed { message: String, retry_label: &'static str },
    /// Request finished with no matches
    Empty { text: &'static str },
    Options(Vec<SearchResult>),
}

/// What is drawn under the last option
#[derive(Clone, Debug, PartialEq)]
pub enum ListFooter {
    None,
    /// More pages exist; shown while scrolling towards them
    Spinner,
    /// A later page failed; earlier pages stay visible above this
    Retry { message: String, retry_label: &'static str },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListView {
    pub body: ListBody,
    pub footer: ListFooter,
    /// Helper text for the input box
    pub input_error: Option<String>,
}

impl ListView {
    pub fn from_state(state: &SearchState, messages: &Messages) -> Self {
        let input_error = state.error.as_ref().map(|e| e.message.clone());

        if state.options.is_empty() {
            let body = match &state.error {
                Some(failure) => ListBody::Failed {
                    message: failure.message.clone(),
                    retry_label: messages.retry,
                },
                None if state.loading => ListBody::Loading { text: messages.loading },
                None => ListBody::Empty { text: messages.no_options },
            };
            return Self {
                body,
                footer: ListFooter::None,
                input_error,
            };
        }

        let footer = match &state.error {
            Some(failure) => ListFooter::Retry {
                message: failure.message.clone(),
                retry_label: messages.retry,
            },
            None if state.has_more_pages => ListFooter::Spinner,
            None => ListFooter::None,
        };

        Self {
            body: ListBody::Options(state.options.clone()),
            footer,
            input_error,
        }
    }
}
