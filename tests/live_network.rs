//! Checks against public hosts. Skipped unless `URLFETCH_LIVE=1`.

use std::time::Duration;

use serial_test::serial;
use urlfetch_conformance::{
    interface, lifecycle, matrix, tables, ErrorKind, HarnessOptions, NativeClient,
    ProtocolRunner, Request, Targets,
};

fn live_targets() -> Option<Targets> {
    if std::env::var("URLFETCH_LIVE").ok().as_deref() != Some("1") {
        eprintln!("skipping live test: set URLFETCH_LIVE=1 to run against public hosts");
        return None;
    }
    match Targets::from_env() {
        Ok(targets) => Some(targets),
        Err(err) => panic!("invalid live targets: {err}"),
    }
}

#[tokio::test]
#[serial(default_timeout)]
async fn live_read_with_default_timeout() {
    let Some(targets) = live_targets() else {
        return;
    };
    let client = NativeClient::new();

    let bytes = interface::check_read_with_default_timeout(
        &client,
        &Request::new(targets.http_url),
        Duration::from_secs(10),
    )
    .await
    .expect("live read must succeed");
    assert!(bytes > 0);
}

#[tokio::test]
async fn live_response_interface() {
    let Some(targets) = live_targets() else {
        return;
    };
    let client = NativeClient::new();
    let request = Request::new(targets.http_url.clone());

    interface::check_basic_read(&client, &request)
        .await
        .expect("root page must read");
    interface::check_info_subtype(&client, &request, "html")
        .await
        .expect("root page must be html");
    lifecycle::check_close_releases_transport(&client, &request)
        .await
        .expect("close must release the transport");

    let kind = interface::check_bad_address(&client, "http://www.python.invalid./")
        .await
        .expect("invalid domain must fail");
    assert_eq!(kind, ErrorKind::Resolution);
}

#[tokio::test]
async fn live_http_table() {
    let Some(targets) = live_targets() else {
        return;
    };
    let client = NativeClient::new();
    let runner = ProtocolRunner::with_options(&client, HarnessOptions::default());

    runner
        .run(
            tables::http_entries(&targets),
            tables::default_handlers(runner.options()),
        )
        .await
        .into_result()
        .expect("http table must pass");
}

#[tokio::test]
#[serial(default_timeout)]
async fn live_timeout_matrix() {
    let Some(targets) = live_targets() else {
        return;
    };
    let client = NativeClient::new();

    matrix::run_matrix(
        &client,
        &Request::new(targets.http_url),
        &matrix::standard_matrix(),
    )
    .await
    .expect("timeout matrix must hold");
}
