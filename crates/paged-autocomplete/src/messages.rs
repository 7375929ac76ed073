//! User-facing strings

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::client::ErrorKind;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    /// Persian
    Fa,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "fa" => Ok(Locale::Fa),
            other => Err(format!("unknown locale {other:?}")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Fa => write!(f, "fa"),
        }
    }
}

/// String table for one locale
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Messages {
    pub server_error: &'static str,
    pub not_found: &'static str,
    pub bad_request: &'static str,
    pub request_failed: &'static str,
    pub network_error: &'static str,
    pub invalid_response: &'static str,
    pub loading: &'static str,
    pub no_options: &'static str,
    pub retry: &'static str,
    pub unknown_error: &'static str,
}

const EN: Messages = Messages {
    server_error: "Server error",
    not_found: "Not found",
    bad_request: "Bad request",
    request_failed: "Request failed",
    network_error: "Network error",
    invalid_response: "Invalid response from server",
    loading: "Loading",
    no_options: "No results found",
    retry: "Retry",
    unknown_error: "Something went wrong",
};

const FA: Messages = Messages {
    server_error: "خطای سرور",
    not_found: "یافت نشد",
    bad_request: "درخواست نامعتبر",
    request_failed: "خطا در انجام درخواست",
    network_error: "خطای شبکه",
    invalid_response: "پاسخ نامعتبر از سرور",
    loading: "در حال بارگذاری",
    no_options: "هیچ نتیجه‌ای یافت نشد",
    retry: "تلاش مجدد",
    unknown_error: "خطایی رخ داده است",
};

impl Messages {
    pub fn for_locale(locale: Locale) -> &'static Messages {
        match locale {
            Locale::En => &EN,
            Locale::Fa => &FA,
        }
    }

    /// Message shown for a failed fetch. `Cancelled` is never displayed, but maps
    /// to the generic text so callers need no special case.
    pub fn error(&self, kind: ErrorKind) -> &'static str {
        match kind {
            ErrorKind::ServerError => self.server_error,
            ErrorKind::NotFound => self.not_found,
            ErrorKind::BadRequest => self.bad_request,
            ErrorKind::RequestFailed => self.request_failed,
            ErrorKind::NetworkError => self.network_error,
            ErrorKind::InvalidResponse => self.invalid_response,
            ErrorKind::Cancelled => self.unknown_error,
        }
    }
}
