//! Checks of the response handle surface: read, info, url, bad addresses.

use std::time::Duration;

use crate::{
    matcher, retry, CheckError, DefaultTimeoutGuard, ErrorKind, FetchOutcome, Request,
    TimeoutArg, UrlEntry, UrlOpener,
};

/// Fetches `target`, reads it fully and closes it. Fails on an empty body.
pub async fn check_basic_read<C>(client: &C, target: &Request) -> Result<usize, CheckError>
where
    C: UrlOpener + ?Sized,
{
    let mut response = retry::open_with_retry(client, target, TimeoutArg::Inherit).await?;
    let read = response.read().await;
    response.close();

    let body = read.map_err(|source| CheckError::UnexpectedFailure {
        url: target.url.clone(),
        source,
    })?;
    if body.is_empty() {
        return Err(CheckError::EmptyBody {
            url: target.url.clone(),
        });
    }
    Ok(body.len())
}

/// Same as [`check_basic_read`] with the process default pinned to
/// `default` for the duration of the fetch.
pub async fn check_read_with_default_timeout<C>(
    client: &C,
    target: &Request,
    default: Duration,
) -> Result<usize, CheckError>
where
    C: UrlOpener + ?Sized,
{
    let _guard = DefaultTimeoutGuard::set(Some(default));
    check_basic_read(client, target).await
}

/// Checks that the `Content-Type` subtype of `target` is `expected`
/// (e.g. `html` for `text/html; charset=utf-8`).
pub async fn check_info_subtype<C>(
    client: &C,
    target: &Request,
    expected: &str,
) -> Result<(), CheckError>
where
    C: UrlOpener + ?Sized,
{
    let mut response = retry::open_with_retry(client, target, TimeoutArg::Inherit).await?;
    let actual = response
        .info()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(content_subtype);
    response.close();

    if actual.as_deref() == Some(expected) {
        Ok(())
    } else {
        Err(CheckError::ContentType {
            url: target.url.clone(),
            expected: expected.to_owned(),
            actual,
        })
    }
}

/// Checks that the response reports the URL that was requested.
pub async fn check_geturl<C>(client: &C, target: &Request) -> Result<(), CheckError>
where
    C: UrlOpener + ?Sized,
{
    let mut response = retry::open_with_retry(client, target, TimeoutArg::Inherit).await?;
    let actual = response.url().to_owned();
    response.close();

    if actual == target.url {
        Ok(())
    } else {
        Err(CheckError::UrlMismatch {
            expected: target.url.clone(),
            actual,
        })
    }
}

/// Checks that opening `url` fails with a client error. Not retried.
pub async fn check_bad_address<C>(client: &C, url: &str) -> Result<ErrorKind, CheckError>
where
    C: UrlOpener + ?Sized,
{
    let entry = UrlEntry::failing(url, ErrorKind::Network);
    let outcome = FetchOutcome::from(client.open(&entry.request, TimeoutArg::Inherit).await);
    match matcher::check(&entry, outcome).await? {
        matcher::Matched::FailedAsExpected { kind } => Ok(kind),
        matcher::Matched::Read { .. } => Err(CheckError::UnexpectedSuccess {
            url: url.to_owned(),
            expected: ErrorKind::Network,
        }),
    }
}

/// `text/html; charset=utf-8` -> `html`.
pub(crate) fn content_subtype(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim();
    let (_, subtype) = essence.split_once('/')?;
    let subtype = subtype.trim();
    (!subtype.is_empty()).then(|| subtype.to_ascii_lowercase())
}
