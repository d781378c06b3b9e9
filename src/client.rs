use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Serialize;

use crate::{Result, TimeoutArg};

/// A fetch request: target URL plus optional payload and extra headers.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Request {
    pub url: String,
    /// Request body. When present, HTTP clients send it as a form POST.
    pub payload: Option<Vec<u8>>,
    pub headers: Vec<(String, String)>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("payload_len", &self.payload.as_ref().map(Vec::len))
            .field("headers", &self.headers)
            .finish()
    }
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            payload: None,
            headers: Vec::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Lower-cased scheme, or an empty string when the URL has none.
    pub fn scheme(&self) -> String {
        self.url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default()
    }
}

impl From<&str> for Request {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Request {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// Protocol handler installed into a client's global configuration.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Handler {
    /// Caches FTP control connections between fetches, dropping idle ones.
    FtpCache { idle_timeout: Duration },
    /// Supplies credentials for requests to `host` challenged with `realm`.
    BasicAuth {
        realm: String,
        host: String,
        user: String,
        #[serde(skip)]
        password: String,
    },
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::FtpCache { idle_timeout } => f
                .debug_struct("FtpCache")
                .field("idle_timeout", idle_timeout)
                .finish(),
            Handler::BasicAuth {
                realm, host, user, ..
            } => f
                .debug_struct("BasicAuth")
                .field("realm", realm)
                .field("host", host)
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Observable state of the transport underneath a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TransportState {
    /// Timeout applied to the transport, `None` meaning it may block forever.
    pub timeout: Option<Duration>,
    pub closed: bool,
}

/// Handle returned by a successful fetch.
#[async_trait]
pub trait Response: Send {
    /// Reads the remainder of the body.
    async fn read(&mut self) -> Result<Vec<u8>>;

    /// Releases the transport. Calling it again has no effect.
    fn close(&mut self);

    /// Response headers (for FTP and file targets, synthesized ones).
    fn info(&self) -> &HeaderMap;

    /// Final URL of the resource.
    fn url(&self) -> &str;

    /// State of the underlying transport.
    fn transport(&self) -> TransportState;
}

impl fmt::Debug for dyn Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("url", &self.url())
            .field("transport", &self.transport())
            .finish()
    }
}

/// A URL-fetching client under test.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    /// Opens `request`, resolving `timeout` against the process default.
    async fn open(&self, request: &Request, timeout: TimeoutArg) -> Result<Box<dyn Response>>;

    /// Replaces the handlers consulted by subsequent opens.
    fn install(&self, handlers: Vec<Handler>);
}
