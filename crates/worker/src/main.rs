use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use report_feed_core::config::Settings;
use report_feed_core::storage::{IngestOptions, ListOrder, ReportStore};

#[derive(Debug, Parser)]
#[command(name = "report_feed_worker")]
struct Args {
    /// Report file to ingest (JSON array or `const reports = [...]` script). Repeatable;
    /// files are ingested in the given order. Defaults to REPORTS_PATH.
    #[arg(long = "input", short = 'i')]
    inputs: Vec<PathBuf>,

    /// Reject a whole file if any of its records is invalid, and stop.
    #[arg(long)]
    strict: bool,

    /// timestamp_desc, ticker_asc or profit_loss_desc.
    #[arg(long, default_value = "timestamp_desc")]
    order: ListOrder,

    /// Print the portfolio summary instead of the report list.
    #[arg(long)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, args);
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "report run failed");
    }
    result
}

fn run(settings: &Settings, args: Args) -> anyhow::Result<()> {
    let inputs = resolve_inputs(settings, args.inputs)?;
    let options = IngestOptions {
        strict: args.strict || settings.strict_ingest,
        ..settings.ingest_options()
    };

    let store = ReportStore::new();
    for path in &inputs {
        let records = report_feed_core::ingest::source::load_records(path)?;
        let outcome = store
            .ingest(&records, options)
            .with_context(|| format!("ingest of {} failed", path.display()))?;

        tracing::info!(
            path = %path.display(),
            batch_id = %outcome.batch_id,
            accepted = outcome.accepted,
            replaced = outcome.replaced,
            stale = outcome.stale,
            rejected = outcome.rejected,
            "ingested report file"
        );
    }

    let out = if args.summary {
        serde_json::to_string_pretty(&store.summary())?
    } else {
        serde_json::to_string_pretty(&store.list(args.order))?
    };
    println!("{out}");
    Ok(())
}

fn resolve_inputs(settings: &Settings, inputs: Vec<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    if !inputs.is_empty() {
        return Ok(inputs);
    }
    let path = settings
        .require_reports_path()
        .context("no --input given")?;
    Ok(vec![PathBuf::from(path)])
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
