//! Standard URL tables for HTTP, FTP and file targets.

use std::path::Path;

use crate::{ErrorKind, FetchError, Handler, HarnessOptions, Request, Targets, UrlEntry};

/// Handlers installed before every table run.
pub fn default_handlers(options: &HarnessOptions) -> Vec<Handler> {
    vec![Handler::FtpCache {
        idle_timeout: options.ftp_idle_timeout(),
    }]
}

/// Root page, a missing page, and a 20-byte range of the root page.
pub fn http_entries(targets: &Targets) -> Vec<UrlEntry> {
    let base = with_trailing_slash(&targets.http_url);
    vec![
        UrlEntry::new(base.as_str()),
        UrlEntry::failing(format!("{base}Spanish/Inquistion/"), ErrorKind::Status),
        UrlEntry::new(Request::new(base.as_str()).with_header("Range", "bytes=20-39"))
            .expect_len(20),
    ]
}

/// Directory listing and a missing file on the FTP target.
pub fn ftp_entries(targets: &Targets) -> Vec<UrlEntry> {
    let base = with_trailing_slash(&targets.ftp_url);
    vec![
        UrlEntry::new(base.as_str()),
        UrlEntry::failing(format!("{base}non-existent-file"), ErrorKind::Network),
    ]
}

/// An existing local file and a path that does not exist.
pub fn file_entries(existing: &Path) -> Result<Vec<UrlEntry>, FetchError> {
    Ok(vec![
        UrlEntry::new(file_url(existing)?),
        UrlEntry::failing("file:///nonsensename/etc/passwd", ErrorKind::Resolution),
    ])
}

/// `file://` URL of an absolute or relative path.
pub fn file_url(path: &Path) -> Result<String, FetchError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    reqwest::Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| FetchError::InvalidUrl {
            url: absolute.display().to_string(),
            message: "path cannot be expressed as a file url".to_owned(),
        })
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_owned()
    } else {
        format!("{url}/")
    }
}
