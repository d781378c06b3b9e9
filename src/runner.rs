//! Drives URL tables through a client.

use std::time::Duration;

use serde::Serialize;

use crate::{
    matcher::{self, Matched},
    retry, CheckError, FailurePolicy, FetchOutcome, Handler, HarnessOptions, TimeoutArg,
    UrlEntry, UrlOpener,
};

/// Result of one entry.
#[derive(Debug, Serialize)]
pub struct EntryReport {
    pub url: String,
    #[serde(serialize_with = "serialize_result")]
    pub result: Result<Matched, CheckError>,
}

impl EntryReport {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Results of a run, in entry order.
///
/// Under [`FailurePolicy::FailFast`] entries after the first failure are
/// absent from `entries` but still counted in `planned`.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// Number of entries handed to the run.
    pub planned: usize,
    pub entries: Vec<EntryReport>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.passed()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Entries never evaluated because the run stopped early.
    pub fn skipped(&self) -> usize {
        self.planned.saturating_sub(self.entries.len())
    }

    /// Converts the report into the matched entries, or every failure.
    ///
    /// The failure total counts every planned entry, skipped ones included.
    pub fn into_result(self) -> Result<Vec<Matched>, CheckError> {
        let total = self.planned;
        let mut matched = Vec::with_capacity(self.entries.len());
        let mut failures = Vec::new();
        for entry in self.entries {
            match entry.result {
                Ok(value) => matched.push(value),
                Err(err) => failures.push(err),
            }
        }
        if failures.is_empty() {
            Ok(matched)
        } else {
            Err(CheckError::Failures { total, failures })
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn serialize_result<S>(
    result: &Result<Matched, CheckError>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    #[derive(Serialize)]
    #[serde(rename_all = "snake_case")]
    enum Repr<'a> {
        Ok(&'a Matched),
        Err(String),
    }

    match result {
        Ok(matched) => Repr::Ok(matched).serialize(serializer),
        Err(err) => Repr::Err(err.to_string()).serialize(serializer),
    }
}

/// Runs URL tables against one client.
pub struct ProtocolRunner<'a, C: UrlOpener + ?Sized> {
    client: &'a C,
    options: HarnessOptions,
}

impl<'a, C: UrlOpener + ?Sized> ProtocolRunner<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self::with_options(client, HarnessOptions::default())
    }

    pub fn with_options(client: &'a C, options: HarnessOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &HarnessOptions {
        &self.options
    }

    /// Installs `handlers`, then fetches and checks each entry in order.
    pub async fn run<I>(&self, entries: I, handlers: Vec<Handler>) -> RunReport
    where
        I: IntoIterator<Item = UrlEntry>,
    {
        self.client.install(handlers);

        let entries: Vec<UrlEntry> = entries.into_iter().collect();
        let delay = self.options.entry_delay();
        let mut report = RunReport {
            planned: entries.len(),
            entries: Vec::with_capacity(entries.len()),
        };
        let mut entries = entries.into_iter().peekable();
        while let Some(entry) = entries.next() {
            let result = self.run_entry(&entry).await;
            let failed = result.is_err();

            #[cfg(feature = "tracing")]
            match &result {
                Ok(matched) => tracing::debug!(url = entry.url(), ?matched, "entry passed"),
                Err(err) => tracing::warn!(url = entry.url(), error = %err, "entry failed"),
            }

            report.entries.push(EntryReport {
                url: entry.request.url.clone(),
                result,
            });

            if failed && self.options.failure_policy == FailurePolicy::FailFast {
                #[cfg(feature = "tracing")]
                tracing::warn!(skipped = report.skipped(), "stopping after first failure");
                break;
            }
            if entries.peek().is_some() {
                pause(delay).await;
            }
        }
        report
    }

    async fn run_entry(&self, entry: &UrlEntry) -> Result<Matched, CheckError> {
        #[cfg(feature = "tracing")]
        tracing::debug!(url = entry.url(), "fetching entry");

        let fetched = if self.options.use_retry {
            retry::open_with_retry(self.client, &entry.request, TimeoutArg::Inherit).await
        } else {
            self.client.open(&entry.request, TimeoutArg::Inherit).await
        };

        #[cfg(feature = "tracing")]
        if let Err(err) = &fetched {
            tracing::debug!(url = entry.url(), error = %err, kind = %err.kind(), "fetch failed");
        }

        matcher::check(entry, FetchOutcome::from(fetched)).await
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
