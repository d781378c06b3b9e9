use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Classification of client errors.
///
/// Kinds form a small hierarchy rooted at [`ErrorKind::Network`]: an
/// expectation of `Network` accepts any client failure, an expectation of
/// `Transient` also accepts `Timeout`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Root of the client error family.
    Network,
    /// Intermittent failure worth retrying (reset, refused mid-flight, brief outage).
    Transient,
    /// Timeout while connecting or reading.
    Timeout,
    /// The address cannot be resolved (unknown host, missing local file).
    Resolution,
    /// The address resolved but nothing accepted the connection.
    Connection,
    /// The server answered with a failing protocol status.
    Status,
    /// The URL is malformed or uses a scheme the client does not handle.
    InvalidUrl,
    /// Local I/O failure outside of addressing.
    Io,
}

impl ErrorKind {
    /// Direct parent in the hierarchy, `None` for the root.
    pub fn parent(self) -> Option<ErrorKind> {
        match self {
            ErrorKind::Network => None,
            ErrorKind::Timeout => Some(ErrorKind::Transient),
            ErrorKind::Transient
            | ErrorKind::Resolution
            | ErrorKind::Connection
            | ErrorKind::Status
            | ErrorKind::InvalidUrl
            | ErrorKind::Io => Some(ErrorKind::Network),
        }
    }

    /// Returns true when `self` equals `ancestor` or descends from it.
    pub fn is_a(self, ancestor: ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Only transient kinds are retried.
    pub fn is_transient(self) -> bool {
        self.is_a(ErrorKind::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Transient => "transient",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Resolution => "resolution",
            ErrorKind::Connection => "connection",
            ErrorKind::Status => "status",
            ErrorKind::InvalidUrl => "invalid-url",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// Error surfaced by a URL-fetching client.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Intermittent transport failure.
    #[error("transient network error for {url}: {message}")]
    Transient { url: String, message: String },
    /// Connect or read exceeded the effective timeout.
    #[error("timed out fetching {url}")]
    Timeout { url: String },
    /// Host or path could not be resolved.
    #[error("cannot resolve {url}: {message}")]
    Resolution { url: String, message: String },
    /// Nothing accepted the connection.
    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },
    /// Non-success protocol status (HTTP status code, FTP reply code).
    #[error("status {code} for {url}")]
    Status { url: String, code: u16 },
    /// Malformed URL or unsupported scheme.
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    /// Local I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transient { .. } => ErrorKind::Transient,
            FetchError::Timeout { .. } => ErrorKind::Timeout,
            FetchError::Resolution { .. } => ErrorKind::Resolution,
            FetchError::Connection { .. } => ErrorKind::Connection,
            FetchError::Status { .. } => ErrorKind::Status,
            FetchError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            FetchError::Io(_) => ErrorKind::Io,
        }
    }

    /// Protocol status code, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}

/// A harness check observed behavior that diverges from its expectation.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("expected {expected} error for {url}, but the fetch succeeded")]
    UnexpectedSuccess { url: String, expected: ErrorKind },
    #[error("expected {expected} error for {url}, got {actual}: {message}")]
    WrongErrorKind {
        url: String,
        expected: ErrorKind,
        actual: ErrorKind,
        message: String,
    },
    #[error("fetching {url} failed unexpectedly: {source}")]
    UnexpectedFailure {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("expected {expected} bytes from {url}, read {actual}")]
    LengthMismatch {
        url: String,
        expected: usize,
        actual: usize,
    },
    #[error("read returned no bytes for {url}")]
    EmptyBody { url: String },
    #[error("scenario {scenario}: expected transport timeout {expected:?}, got {actual:?}")]
    TimeoutMismatch {
        scenario: String,
        expected: Option<Duration>,
        actual: Option<Duration>,
    },
    #[error("transport of {url} was not open after fetch")]
    TransportNotOpen { url: String },
    #[error("transport of {url} still open after close")]
    TransportLeak { url: String },
    #[error("expected content subtype {expected} for {url}, got {actual:?}")]
    ContentType {
        url: String,
        expected: String,
        actual: Option<String>,
    },
    #[error("requested {expected}, response reports {actual}")]
    UrlMismatch { expected: String, actual: String },
    #[error("setup fetch failed: {0}")]
    Setup(#[from] FetchError),
    #[error("{} of {total} entries failed; first: {}", .failures.len(), first_failure(.failures))]
    Failures {
        total: usize,
        failures: Vec<CheckError>,
    },
}

fn first_failure(failures: &[CheckError]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, FetchError};

    #[test]
    fn timeout_is_transient_and_network() {
        assert!(ErrorKind::Timeout.is_a(ErrorKind::Transient));
        assert!(ErrorKind::Timeout.is_a(ErrorKind::Network));
        assert!(ErrorKind::Timeout.is_transient());
    }

    #[test]
    fn siblings_do_not_match() {
        assert!(!ErrorKind::Resolution.is_a(ErrorKind::Connection));
        assert!(!ErrorKind::Status.is_a(ErrorKind::Transient));
        assert!(!ErrorKind::Network.is_a(ErrorKind::Resolution));
    }

    #[test]
    fn status_error_exposes_code() {
        let err = FetchError::Status {
            url: "http://example.test/".to_owned(),
            code: 401,
        };
        assert_eq!(err.kind(), ErrorKind::Status);
        assert_eq!(err.status(), Some(401));
        assert!(!err.is_transient());
    }
}
