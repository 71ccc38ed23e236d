/// Error taxonomy shared by the fetcher, the orchestrator and callers
///
/// The set is closed: every failure a URL can produce is labelled with exactly
/// one of these kinds.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified failure kind for one scraped URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// HTTP 429 from the target
    RateLimit,

    /// HTTP 403 from the target
    Forbidden,

    /// HTTP 5xx from the target
    ServerError,

    /// The request did not finish within the fetch timeout
    Timeout,

    /// Connection refused, DNS failure, TLS failure or a broken body stream
    Network,

    /// The response could not be read as an HTML document
    Parse,

    /// Anything else, including rejected URLs and other 4xx responses
    Unknown,
}

impl ErrorKind {
    /// Returns true if a failure of this kind may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::ServerError | Self::Timeout | Self::Network
        )
    }

    /// Returns the wire label of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate-limit",
            Self::Forbidden => "forbidden",
            Self::ServerError => "server-error",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Parse => "parse",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a wire label
    ///
    /// Returns None if the string doesn't match any known kind.
    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "rate-limit" => Some(Self::RateLimit),
            "forbidden" => Some(Self::Forbidden),
            "server-error" => Some(Self::ServerError),
            "timeout" => Some(Self::Timeout),
            "network" => Some(Self::Network),
            "parse" => Some(Self::Parse),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Short description suitable for a results table
    pub fn description(&self) -> &'static str {
        match self {
            Self::RateLimit => "Target is rate limiting requests",
            Self::Forbidden => "Access forbidden by target",
            Self::ServerError => "Target server error",
            Self::Timeout => "Request timed out",
            Self::Network => "Network or DNS failure",
            Self::Parse => "Page could not be parsed",
            Self::Unknown => "Unknown error",
        }
    }

    /// Returns all kinds in display order
    pub fn all() -> [Self; 7] {
        [
            Self::RateLimit,
            Self::Forbidden,
            Self::ServerError,
            Self::Timeout,
            Self::Network,
            Self::Parse,
            Self::Unknown,
        ]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::RateLimit.is_retryable());
        assert!(ErrorKind::ServerError.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(ErrorKind::Network.is_retryable());

        assert!(!ErrorKind::Forbidden.is_retryable());
        assert!(!ErrorKind::Parse.is_retryable());
        assert!(!ErrorKind::Unknown.is_retryable());
    }

    #[test]
    fn test_labels() {
        assert_eq!(ErrorKind::RateLimit.as_str(), "rate-limit");
        assert_eq!(ErrorKind::ServerError.to_string(), "server-error");
        assert_eq!(ErrorKind::from_label("forbidden"), Some(ErrorKind::Forbidden));
        assert_eq!(ErrorKind::from_label("teapot"), None);

        for kind in ErrorKind::all() {
            assert_eq!(ErrorKind::from_label(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&ErrorKind::ServerError).unwrap();
        assert_eq!(json, "\"server-error\"");

        let kind: ErrorKind = serde_json::from_str("\"rate-limit\"").unwrap();
        assert_eq!(kind, ErrorKind::RateLimit);
    }
}
