use std::time::Duration;

use urlfetch_conformance::{
    interface, lifecycle, matrix, tables, HarnessOptions, NativeClient, ProtocolRunner, Request,
    Targets,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let targets = Targets::from_env().map_err(anyhow::Error::msg)?;
    let client = NativeClient::new();
    let runner = ProtocolRunner::with_options(&client, HarnessOptions::default());
    let root = Request::new(targets.http_url.clone());

    interface::check_read_with_default_timeout(&client, &root, Duration::from_secs(10)).await?;
    interface::check_geturl(&client, &root).await?;
    lifecycle::check_close_releases_transport(&client, &root).await?;
    matrix::run_matrix(&client, &root, &matrix::standard_matrix()).await?;

    let report = runner
        .run(
            tables::http_entries(&targets),
            tables::default_handlers(runner.options()),
        )
        .await;
    println!("{}", report.to_json()?);

    report.into_result()?;
    Ok(())
}
