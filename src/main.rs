//! FBA Orders Import - creates Spire sales orders from an Amazon order report

use anyhow::{Context, Result};
use fba_orders_import::backend::SpireClient;
use fba_orders_import::config::ImportConfig;
use fba_orders_import::domain::aggregates::OrderAggregator;
use fba_orders_import::submission::SubmissionDriver;
use fba_orders_import::{source, telemetry};
use tracing::Instrument;
use uuid::Uuid;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = ImportConfig::from_env().context("loading configuration")?;
    telemetry::init(&config.log_file).with_context(|| format!("opening log file {}", config.log_file.display()))?;

    let span = tracing::info_span!("import", run_id = %Uuid::now_v7());
    run(config).instrument(span).await
}

async fn run(config: ImportConfig) -> Result<()> {
    tracing::info!(report = %config.report_file.display(), sheet = %config.sheet_name, "Loading report");
    let records = source::load_records(&config.report_file, &config.sheet_name)
        .with_context(|| format!("reading {}", config.report_file.display()))?;

    let orders = OrderAggregator::new(config.defaults.clone()).build(&records);
    tracing::info!("Read {} report rows, built {} sales orders", records.len(), orders.len());

    let spire = SpireClient::new(&config.spire).context("building Spire client")?;
    let summary = SubmissionDriver::new(&spire, config.defaults.payment_method.as_str()).run(&orders).await;

    tracing::info!(
        invoiced = summary.invoiced,
        skipped = summary.skipped,
        create_failed = summary.create_failed,
        payment_failed = summary.payment_failed,
        invoice_failed = summary.invoice_failed,
        "Import finished"
    );
    Ok(())
}
