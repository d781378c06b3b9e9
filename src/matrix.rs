//! Process-default × per-request timeout scenarios.
//!
//! Each scenario pins the process-wide default, opens a target with a given
//! [`TimeoutArg`], and compares the timeout applied to the transport with
//! the resolution rule: an explicit value wins, otherwise the process
//! default, otherwise no timeout.

use std::time::Duration;

use serde::Serialize;

use crate::{retry, CheckError, DefaultTimeoutGuard, Request, TimeoutArg, UrlOpener};

/// One cell of the timeout matrix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimeoutScenario {
    pub name: String,
    /// Process-wide default applied for the duration of the scenario.
    pub process_default: Option<Duration>,
    pub request: TimeoutArg,
    /// Timeout the transport must report.
    pub expected: Option<Duration>,
}

impl TimeoutScenario {
    /// Builds a scenario whose expectation follows the resolution rule.
    pub fn new(
        name: impl Into<String>,
        process_default: Option<Duration>,
        request: TimeoutArg,
    ) -> Self {
        Self {
            name: name.into(),
            process_default,
            request,
            expected: request.resolve(process_default),
        }
    }
}

pub const MATRIX_DEFAULT: Duration = Duration::from_secs(60);
pub const MATRIX_OVERRIDE: Duration = Duration::from_secs(120);

/// `{no default, 60s default} × {inherit, use default, 120s}`.
pub fn standard_matrix() -> Vec<TimeoutScenario> {
    let defaults = [("no_default", None), ("default_60", Some(MATRIX_DEFAULT))];
    let requests = [
        ("inherit", TimeoutArg::Inherit),
        ("use_default", TimeoutArg::UseDefault),
        ("fixed_120", TimeoutArg::Fixed(MATRIX_OVERRIDE)),
    ];

    defaults
        .iter()
        .flat_map(|&(default_name, process_default)| {
            requests.iter().map(move |&(request_name, request)| {
                TimeoutScenario::new(
                    format!("{default_name}/{request_name}"),
                    process_default,
                    request,
                )
            })
        })
        .collect()
}

/// Runs one scenario against `target`.
///
/// The process default is restored before this returns, whatever the
/// outcome.
pub async fn run_scenario<C>(
    client: &C,
    target: &Request,
    scenario: &TimeoutScenario,
) -> Result<(), CheckError>
where
    C: UrlOpener + ?Sized,
{
    let _guard = DefaultTimeoutGuard::set(scenario.process_default);

    let mut response = retry::open_with_retry(client, target, scenario.request).await?;
    let actual = response.transport().timeout;
    response.close();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        scenario = %scenario.name,
        url = %target.url,
        expected = ?scenario.expected,
        ?actual,
        "timeout scenario"
    );

    if actual != scenario.expected {
        return Err(CheckError::TimeoutMismatch {
            scenario: scenario.name.clone(),
            expected: scenario.expected,
            actual,
        });
    }
    Ok(())
}

/// Runs every scenario in order, stopping at the first mismatch.
pub async fn run_matrix<C>(
    client: &C,
    target: &Request,
    scenarios: &[TimeoutScenario],
) -> Result<(), CheckError>
where
    C: UrlOpener + ?Sized,
{
    for scenario in scenarios {
        run_scenario(client, target, scenario).await?;
    }
    Ok(())
}
