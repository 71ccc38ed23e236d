//! Failure classification
//!
//! Maps raw failures onto the closed [`ErrorKind`] taxonomy. The fetcher uses
//! it for retry decisions; callers use it to label failures they only know by
//! message.

use crate::state::ErrorKind;
use once_cell::sync::Lazy;
use regex::Regex;

/// A failure as observed before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFailure {
    /// The server answered with a non-success status
    Status(u16),

    /// The request did not complete within the timeout
    Timeout,

    /// Connecting failed (refused, DNS, TLS)
    Connection(String),

    /// The response body could not be read
    Body(String),

    /// A redirect was refused or the redirect chain was too long
    Redirect(String),

    /// The document could not be parsed
    Parse(String),

    /// Anything else, known only by its message
    Other(String),
}

/// Classifies an HTTP status code
///
/// # Mapping
///
/// | Status | Kind |
/// |--------|------|
/// | 429 | rate-limit |
/// | 403 | forbidden |
/// | 5xx | server-error |
/// | other | unknown |
pub fn classify_status(status: u16) -> ErrorKind {
    match status {
        429 => ErrorKind::RateLimit,
        403 => ErrorKind::Forbidden,
        500..=599 => ErrorKind::ServerError,
        _ => ErrorKind::Unknown,
    }
}

/// Classifies a raw failure
pub fn classify(failure: &RawFailure) -> ErrorKind {
    match failure {
        RawFailure::Status(status) => classify_status(*status),
        RawFailure::Timeout => ErrorKind::Timeout,
        RawFailure::Connection(_) | RawFailure::Body(_) => ErrorKind::Network,
        RawFailure::Parse(_) => ErrorKind::Parse,
        RawFailure::Redirect(_) => ErrorKind::Unknown,
        RawFailure::Other(message) => classify_message(message),
    }
}

static MESSAGE_RULES: Lazy<Vec<(Regex, ErrorKind)>> = Lazy::new(|| {
    [
        (r"(?i)rate.?limit|\b429\b", ErrorKind::RateLimit),
        (r"(?i)forbidden|blocked|access denied|\b403\b", ErrorKind::Forbidden),
        (r"(?i)\b5\d\d\b|server error|internal", ErrorKind::ServerError),
        (r"(?i)timeout|abort|timed out", ErrorKind::Timeout),
        (r"(?i)network|fetch|econnrefused|enotfound|dns|connection", ErrorKind::Network),
        (r"(?i)parse|syntax|unexpected", ErrorKind::Parse),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(pattern).expect("valid classifier pattern"), kind))
    .collect()
});

/// Classifies a failure known only by its message
///
/// Rules are tried in taxonomy order; the first match wins.
pub fn classify_message(message: &str) -> ErrorKind {
    MESSAGE_RULES
        .iter()
        .find(|(pattern, _)| pattern.is_match(message))
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}
