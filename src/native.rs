use std::fmt;
use std::io;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Url;
use tokio::io::AsyncReadExt;

use crate::{
    FetchError, Handler, Request, Response, Result, TimeoutArg, TransportState, UrlOpener,
};

/// Reference client over `reqwest` (http, https) and `tokio::fs` (file).
///
/// Timeouts are resolved per request against the process-wide default and
/// applied to the request; `None` leaves the transport without a timeout.
/// Other schemes, `ftp` included, fail with [`FetchError::InvalidUrl`].
pub struct NativeClient {
    http: reqwest::Client,
    handlers: RwLock<Vec<Handler>>,
}

impl fmt::Debug for NativeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeClient")
            .field("handlers", &*self.handlers.read().unwrap_or_else(PoisonError::into_inner))
            .finish()
    }
}

impl Default for NativeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeClient {
    pub fn new() -> Self {
        Self::with_http(reqwest::Client::new())
    }

    /// Wraps an existing `reqwest` client. It must not carry its own timeout.
    pub fn with_http(http: reqwest::Client) -> Self {
        Self {
            http,
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Handlers currently installed.
    pub fn handlers(&self) -> Vec<Handler> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn credentials_for(&self, url: &Url) -> Option<(String, String)> {
        let host = url.host_str()?;
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find_map(|handler| match handler {
                Handler::BasicAuth {
                    host: auth_host,
                    user,
                    password,
                    ..
                } if auth_host.eq_ignore_ascii_case(host) => Some((user.clone(), password.clone())),
                _ => None,
            })
    }

    async fn open_http(
        &self,
        request: &Request,
        timeout: Option<Duration>,
    ) -> Result<Box<dyn Response>> {
        let url = parse_url(&request.url)?;
        let mut builder = match &request.payload {
            Some(payload) => self
                .http
                .post(url.clone())
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(payload.clone()),
            None => self.http.get(url.clone()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some((user, password)) = self.credentials_for(&url) {
            builder = builder.basic_auth(user, Some(password));
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| classify_reqwest(&request.url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: request.url.clone(),
                code: status.as_u16(),
            });
        }

        Ok(Box::new(HttpResponse {
            url: response.url().to_string(),
            headers: response.headers().clone(),
            inner: Some(response),
            timeout,
        }))
    }
}

#[async_trait]
impl UrlOpener for NativeClient {
    async fn open(&self, request: &Request, timeout: TimeoutArg) -> Result<Box<dyn Response>> {
        let timeout = timeout.effective();

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %request.url, ?timeout, "opening");

        match request.scheme().as_str() {
            "http" | "https" => self.open_http(request, timeout).await,
            "file" => open_file(request, timeout).await,
            "" => Err(FetchError::InvalidUrl {
                url: request.url.clone(),
                message: "missing scheme".to_owned(),
            }),
            other => Err(FetchError::InvalidUrl {
                url: request.url.clone(),
                message: format!("unsupported scheme '{other}'"),
            }),
        }
    }

    fn install(&self, handlers: Vec<Handler>) {
        #[cfg(feature = "tracing")]
        tracing::debug!(?handlers, "installing handlers");

        *self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner) = handlers;
    }
}

struct HttpResponse {
    url: String,
    headers: HeaderMap,
    inner: Option<reqwest::Response>,
    timeout: Option<Duration>,
}

#[async_trait]
impl Response for HttpResponse {
    async fn read(&mut self) -> Result<Vec<u8>> {
        match self.inner.take() {
            Some(response) => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|err| classify_reqwest(&self.url, err))?;
                Ok(body.to_vec())
            }
            None => Ok(Vec::new()),
        }
    }

    fn close(&mut self) {
        // Dropping the response releases its connection.
        self.inner = None;
    }

    fn info(&self) -> &HeaderMap {
        &self.headers
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn transport(&self) -> TransportState {
        TransportState {
            timeout: self.timeout,
            // Reading consumes the response, which hands its connection back.
            closed: self.inner.is_none(),
        }
    }
}

struct FileResponse {
    url: String,
    headers: HeaderMap,
    file: Option<tokio::fs::File>,
    timeout: Option<Duration>,
}

#[async_trait]
impl Response for FileResponse {
    async fn read(&mut self) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        if let Some(file) = self.file.as_mut() {
            file.read_to_end(&mut body).await?;
        }
        Ok(body)
    }

    fn close(&mut self) {
        self.file = None;
    }

    fn info(&self) -> &HeaderMap {
        &self.headers
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn transport(&self) -> TransportState {
        TransportState {
            timeout: self.timeout,
            closed: self.file.is_none(),
        }
    }
}

async fn open_file(request: &Request, timeout: Option<Duration>) -> Result<Box<dyn Response>> {
    let url = parse_url(&request.url)?;
    let path = url.to_file_path().map_err(|()| FetchError::Resolution {
        url: request.url.clone(),
        message: "file not on local host".to_owned(),
    })?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FetchError::Resolution {
                url: request.url.clone(),
                message: err.to_string(),
            },
            _ => FetchError::Io(err),
        })?;
    let metadata = file.metadata().await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, guess_content_type(&path));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));

    Ok(Box::new(FileResponse {
        url: request.url.clone(),
        headers,
        file: Some(file),
        timeout,
    }))
}

fn guess_content_type(path: &Path) -> HeaderValue {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match extension.as_deref() {
        Some("html" | "htm") => "text/html",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    };
    HeaderValue::from_static(mime)
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|err| FetchError::InvalidUrl {
        url: url.to_owned(),
        message: err.to_string(),
    })
}

fn classify_reqwest(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout {
            url: url.to_owned(),
        };
    }
    if err.is_builder() || err.is_redirect() {
        return FetchError::InvalidUrl {
            url: url.to_owned(),
            message: err.to_string(),
        };
    }
    if err.is_connect() {
        return classify_connect(url, &err);
    }
    FetchError::Transient {
        url: url.to_owned(),
        message: err.to_string(),
    }
}

fn classify_connect(url: &str, err: &reqwest::Error) -> FetchError {
    let message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return FetchError::Resolution {
                url: url.to_owned(),
                message: text,
            };
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::ConnectionRefused {
                return FetchError::Connection {
                    url: url.to_owned(),
                    message: text,
                };
            }
        }
        source = cause.source();
    }
    FetchError::Transient {
        url: url.to_owned(),
        message,
    }
}
