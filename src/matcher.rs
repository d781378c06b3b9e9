//! Decides whether a fetch outcome satisfies a URL entry.

use serde::Serialize;

use crate::{CheckError, ErrorKind, FetchOutcome, UrlEntry};

/// How an entry was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Matched {
    /// The fetch succeeded and the whole body was read.
    Read { bytes: usize },
    /// The fetch failed with an acceptable kind.
    FailedAsExpected { kind: ErrorKind },
}

/// Checks `outcome` against `entry`.
///
/// For a successful fetch the body is read to the end and the handle is
/// closed. A success where an error was expected is never read.
pub async fn check(entry: &UrlEntry, outcome: FetchOutcome) -> Result<Matched, CheckError> {
    let url = entry.url();
    match (entry.expected_error, outcome) {
        (None, FetchOutcome::Success(mut response)) => {
            let read = response.read().await;
            response.close();
            let body = read.map_err(|source| CheckError::UnexpectedFailure {
                url: url.to_owned(),
                source,
            })?;

            #[cfg(feature = "tracing")]
            tracing::debug!(url, bytes = body.len(), "read response body");

            if let Some(expected) = entry.expected_len {
                if body.len() != expected {
                    return Err(CheckError::LengthMismatch {
                        url: url.to_owned(),
                        expected,
                        actual: body.len(),
                    });
                }
            }
            Ok(Matched::Read { bytes: body.len() })
        }
        (None, FetchOutcome::Failure(source)) => Err(CheckError::UnexpectedFailure {
            url: url.to_owned(),
            source,
        }),
        (Some(expected), FetchOutcome::Success(mut response)) => {
            response.close();
            Err(CheckError::UnexpectedSuccess {
                url: url.to_owned(),
                expected,
            })
        }
        (Some(expected), FetchOutcome::Failure(err)) => {
            let actual = err.kind();
            if actual.is_a(expected) {
                Ok(Matched::FailedAsExpected { kind: actual })
            } else {
                Err(CheckError::WrongErrorKind {
                    url: url.to_owned(),
                    expected,
                    actual,
                    message: err.to_string(),
                })
            }
        }
    }
}

/// Boolean form of [`check`].
pub async fn matches(entry: &UrlEntry, outcome: FetchOutcome) -> bool {
    check(entry, outcome).await.is_ok()
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use reqwest::header::HeaderMap;

    use super::{check, matches, Matched};
    use crate::{
        CheckError, ErrorKind, FetchError, FetchOutcome, Response, TransportState, UrlEntry,
    };

    struct StubResponse {
        body: Vec<u8>,
        headers: HeaderMap,
        reads: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
    }

    impl StubResponse {
        fn boxed(body: &[u8]) -> (Box<dyn Response>, Arc<AtomicUsize>, Arc<AtomicBool>) {
            let reads = Arc::new(AtomicUsize::new(0));
            let closed = Arc::new(AtomicBool::new(false));
            let response = StubResponse {
                body: body.to_vec(),
                headers: HeaderMap::new(),
                reads: reads.clone(),
                closed: closed.clone(),
            };
            (Box::new(response), reads, closed)
        }
    }

    #[async_trait]
    impl Response for StubResponse {
        async fn read(&mut self) -> crate::Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(std::mem::take(&mut self.body))
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        fn info(&self) -> &HeaderMap {
            &self.headers
        }

        fn url(&self) -> &str {
            "http://example.test/"
        }

        fn transport(&self) -> TransportState {
            TransportState {
                timeout: None,
                closed: self.closed.load(Ordering::SeqCst),
            }
        }
    }

    fn resolution_error() -> FetchError {
        FetchError::Resolution {
            url: "file:///nonexistent/path".to_owned(),
            message: "no such file".to_owned(),
        }
    }

    #[tokio::test]
    async fn success_reads_body_and_closes() {
        let (response, reads, closed) = StubResponse::boxed(b"hi there\n");
        let entry = UrlEntry::new("http://example.test/");

        let matched = check(&entry, FetchOutcome::Success(response))
            .await
            .expect("success entry must match");

        assert_eq!(matched, Matched::Read { bytes: 9 });
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn length_mismatch_fails() {
        let (response, _, _) = StubResponse::boxed(&[0; 30]);
        let entry = UrlEntry::new("http://example.test/").expect_len(20);

        let err = check(&entry, FetchOutcome::Success(response))
            .await
            .expect_err("30 bytes must not match 20");

        assert!(matches!(
            err,
            CheckError::LengthMismatch {
                expected: 20,
                actual: 30,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn success_when_error_expected_is_never_read() {
        let (response, reads, closed) = StubResponse::boxed(b"content");
        let entry = UrlEntry::failing("file:///nonexistent/path", ErrorKind::Resolution);

        let err = check(&entry, FetchOutcome::Success(response))
            .await
            .expect_err("unexpected success must fail");

        assert!(matches!(
            err,
            CheckError::UnexpectedSuccess {
                expected: ErrorKind::Resolution,
                ..
            }
        ));
        assert_eq!(reads.load(Ordering::SeqCst), 0);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn expected_kind_and_descendants_match() {
        let exact = UrlEntry::failing("file:///nonexistent/path", ErrorKind::Resolution);
        assert!(matches(&exact, FetchOutcome::Failure(resolution_error())).await);

        let family = UrlEntry::failing("file:///nonexistent/path", ErrorKind::Network);
        let matched = check(&family, FetchOutcome::Failure(resolution_error()))
            .await
            .expect("resolution is a network error");
        assert_eq!(
            matched,
            Matched::FailedAsExpected {
                kind: ErrorKind::Resolution
            }
        );
    }

    #[tokio::test]
    async fn wrong_kind_names_expected_and_actual() {
        let entry = UrlEntry::failing("http://example.test/", ErrorKind::Status);
        let err = check(&entry, FetchOutcome::Failure(resolution_error()))
            .await
            .expect_err("resolution is not a status error");

        let message = err.to_string();
        assert!(message.contains("expected status"), "{message}");
        assert!(message.contains("got resolution"), "{message}");
    }

    #[tokio::test]
    async fn failure_without_expectation_fails() {
        let entry = UrlEntry::new("http://example.test/");
        let err = check(&entry, FetchOutcome::Failure(resolution_error()))
            .await
            .expect_err("unexpected failure");

        assert!(matches!(err, CheckError::UnexpectedFailure { .. }));
    }
}
