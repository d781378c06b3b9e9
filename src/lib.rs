//! `urlfetch-conformance` checks the observable behavior of a URL-fetching
//! client against live or mocked endpoints.
//!
//! The client is anything implementing [`UrlOpener`]. The harness provides:
//! - [`retry::open_with_retry`]: bounded retry over transient errors
//! - [`matcher::check`]: decides whether a fetch satisfies a [`UrlEntry`]
//! - [`ProtocolRunner`]: drives URL tables through a client
//! - [`matrix::run_matrix`]: default × per-request timeout scenarios
//! - [`lifecycle::check_close_releases_transport`]: close propagates to the transport
//!
//! [`NativeClient`] is a reference client over `reqwest` and `tokio::fs`.

mod client;
mod error;
mod native;
mod options;
mod runner;
mod timeout;
mod types;

pub mod interface;
pub mod lifecycle;
pub mod matcher;
pub mod matrix;
pub mod retry;
pub mod tables;

pub use client::{Handler, Request, Response, TransportState, UrlOpener};
pub use error::{CheckError, ErrorKind, FetchError};
pub use native::NativeClient;
pub use options::{FailurePolicy, HarnessOptions, Targets, FTP_URL_VAR, HTTP_URL_VAR};
pub use runner::{EntryReport, ProtocolRunner, RunReport};
pub use timeout::{default_timeout, set_default_timeout, DefaultTimeoutGuard, TimeoutArg};
pub use types::{FetchOutcome, UrlEntry};

pub type Result<T> = std::result::Result<T, FetchError>;
