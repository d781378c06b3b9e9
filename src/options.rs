use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a run does after an entry fails.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Evaluate every entry and report all failures together.
    #[default]
    ContinueAndAggregate,
    /// Stop at the first failing entry.
    FailFast,
}

/// Configures how URL tables are driven.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessOptions {
    /// Pause between entries in milliseconds.
    pub entry_delay_ms: u64,
    /// Idle timeout of the FTP connection cache in milliseconds.
    pub ftp_idle_timeout_ms: u64,
    pub failure_policy: FailurePolicy,
    /// Open entries through the transient retry wrapper.
    pub use_retry: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            entry_delay_ms: 100,
            ftp_idle_timeout_ms: 1_000,
            failure_policy: FailurePolicy::default(),
            use_retry: true,
        }
    }
}

impl HarnessOptions {
    pub fn entry_delay(&self) -> Duration {
        Duration::from_millis(self.entry_delay_ms)
    }

    pub fn ftp_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.ftp_idle_timeout_ms)
    }
}

pub const HTTP_URL_VAR: &str = "URLFETCH_HTTP_URL";
pub const FTP_URL_VAR: &str = "URLFETCH_FTP_URL";

/// Remote endpoints the checks are pointed at.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Targets {
    pub http_url: String,
    pub ftp_url: String,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            http_url: "https://www.python.org/".to_owned(),
            ftp_url: "ftp://ftp.mirror.nl/pub/mirror/gnu/".to_owned(),
        }
    }
}

impl Targets {
    /// Reads targets from the environment.
    ///
    /// Reads:
    /// - `URLFETCH_HTTP_URL`: HTTP target
    /// - `URLFETCH_FTP_URL`: FTP directory target
    ///
    /// Unset variables keep their defaults; set but empty ones are an error.
    pub fn from_env() -> Result<Self, String> {
        let mut targets = Self::default();
        if let Some(url) = read_var(HTTP_URL_VAR)? {
            targets.http_url = url;
        }
        if let Some(url) = read_var(FTP_URL_VAR)? {
            targets.ftp_url = url;
        }
        Ok(targets)
    }

    /// Loads targets from a JSON file such as `{"http_url": "..."}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|err| format!("{} could not be read: {err}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(|err| format!("{} could not be parsed: {err}", path.display()))
    }
}

fn read_var(name: &str) -> Result<Option<String>, String> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Err(format!("{name} is set but empty")),
        Ok(value) => Ok(Some(value.trim().to_owned())),
        Err(_) => Ok(None),
    }
}
