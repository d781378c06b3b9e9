use serde::Serialize;

use crate::{ErrorKind, FetchError, Request, Response};

/// One row of a URL table: the request and what it should produce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UrlEntry {
    pub request: Request,
    /// Kind the fetch must fail with. `None` means the fetch must succeed.
    pub expected_error: Option<ErrorKind>,
    /// Exact body length, when the target pins it (e.g. a byte range).
    pub expected_len: Option<usize>,
}

impl UrlEntry {
    /// Entry expected to succeed.
    pub fn new(request: impl Into<Request>) -> Self {
        Self {
            request: request.into(),
            expected_error: None,
            expected_len: None,
        }
    }

    /// Entry expected to fail with `kind` or one of its descendants.
    pub fn failing(request: impl Into<Request>, kind: ErrorKind) -> Self {
        Self::new(request).expect_error(kind)
    }

    pub fn expect_error(mut self, kind: ErrorKind) -> Self {
        self.expected_error = Some(kind);
        self
    }

    pub fn expect_len(mut self, len: usize) -> Self {
        self.expected_len = Some(len);
        self
    }

    pub fn url(&self) -> &str {
        &self.request.url
    }
}

impl From<&str> for UrlEntry {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Result of fetching one entry, before it is checked.
#[derive(Debug)]
pub enum FetchOutcome {
    Success(Box<dyn Response>),
    Failure(FetchError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// Kind of the failure, `None` for a success.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure(err) => Some(err.kind()),
        }
    }
}

impl From<crate::Result<Box<dyn Response>>> for FetchOutcome {
    fn from(result: crate::Result<Box<dyn Response>>) -> Self {
        match result {
            Ok(response) => FetchOutcome::Success(response),
            Err(err) => FetchOutcome::Failure(err),
        }
    }
}
