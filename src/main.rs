mod audit_log;
mod config;
mod error;
mod exporter;
mod models;
mod planner;
mod report;
mod storage;

#[cfg(test)]
mod test_support;

use lambda_runtime::{Error, LambdaEvent, service_fn};
use tracing_subscriber::EnvFilter;

use audit_log::CloudTrailAuditLog;
use config::ExporterConfig;
use exporter::{DailyUsageExporter, ExportSummary};
use storage::S3ReportStore;

type Exporter = DailyUsageExporter<CloudTrailAuditLog, S3ReportStore>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ExporterConfig::from_env()?;
    tracing::info!("Starting QuickSight usage importer for bucket {}", config.bucket);

    let aws_config = aws_config::load_from_env().await;
    let audit_log = CloudTrailAuditLog::new(aws_sdk_cloudtrail::Client::new(&aws_config));
    let store = S3ReportStore::new(
        storage::s3_client(&aws_config, config.use_path_style_buckets),
        config.bucket.clone(),
    );

    let exporter = DailyUsageExporter::new(config, audit_log, store);

    lambda_runtime::run(service_fn(|event| handle_schedule(event, &exporter))).await
}

/// The scheduled trigger carries nothing we need; every invocation exports up to yesterday (UTC).
async fn handle_schedule(
    event: LambdaEvent<serde_json::Value>,
    exporter: &Exporter,
) -> Result<ExportSummary, Error> {
    tracing::info!(
        "Invocation {} for bucket {}",
        event.context.request_id,
        exporter.config().bucket
    );

    let today = chrono::Utc::now().date_naive();
    let summary = exporter.run(today).await.map_err(|err| {
        tracing::error!("QuickSight usage export failed: {}", err);
        err
    })?;

    tracing::info!(
        "Exported {} reports, skipped {}",
        summary.exported.len(),
        summary.skipped.len()
    );
    Ok(summary)
}
