use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use cobranza_attribution::{BatchReconciler, EffectivenessReport, ReconcileSummary, RosterFreezer};
use cobranza_platform::{AttributionRunCompleted, PgCollectionStore, RedisBus, ServiceConfig};
use futures_util::StreamExt;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "cobranza-ops",
    version,
    about = "Payment attribution batch jobs for the collections database"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attribute every payment recorded on a day
    Reconcile {
        /// Day to reconcile, YYYY-MM-DD (defaults to yesterday)
        date: Option<NaiveDate>,
    },
    /// Freeze the roster snapshot of a campaign
    Freeze {
        /// Campaign whose enrolled credits are captured
        campaign_id: i64,
        /// Capture date, YYYY-MM-DD (defaults to today)
        date: Option<NaiveDate>,
    },
    /// Print the per-agent effectiveness report of a day as JSON
    Report {
        /// Day to report on, YYYY-MM-DD (defaults to yesterday)
        date: Option<NaiveDate>,
    },
    /// Reconcile days as requests arrive on the bus
    Listen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Job {
    Reconcile(NaiveDate),
    Freeze { campaign_id: i64, date: NaiveDate },
    Report(NaiveDate),
    Listen,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "cobranza_ops=info,cobranza_attribution=info".to_string()
        }))
        .init();

    let job = Cli::parse().command.with_default_dates(Local::now().date_naive());

    let config = ServiceConfig::worker_from_env()?;
    let store = PgCollectionStore::connect(&config).await?;
    let bus = config
        .redis_url
        .as_deref()
        .map(RedisBus::connect)
        .transpose()?;

    match job {
        Job::Reconcile(date) => {
            let summary = reconcile(&store, &config, bus.as_ref(), date).await?;
            if summary.failed > 0 {
                warn!(
                    %date,
                    failed = summary.failed,
                    "some payments were not attributed; rerun the day to retry"
                );
            }
        }
        Job::Freeze { campaign_id, date } => {
            RosterFreezer::new(&store).freeze(campaign_id, date).await?;
        }
        Job::Report(date) => {
            let report = EffectivenessReport::for_day(&store, date).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Job::Listen => {
            let bus = bus.context("listen mode requires REDIS_URL")?;
            listen(&store, &config, &bus).await?;
        }
    }

    Ok(())
}

async fn listen(store: &PgCollectionStore, config: &ServiceConfig, bus: &RedisBus) -> Result<()> {
    let mut requests = bus.reconcile_requests().await?;
    info!("ops worker subscribed to reconcile requests");

    loop {
        let request = requests
            .next()
            .await
            .context("reconcile request stream ended unexpectedly")?;

        match request {
            Ok(request) => {
                info!(
                    date = %request.date,
                    requested_by = %request.requested_by,
                    "reconcile requested"
                );
                if let Err(err) = reconcile(store, config, Some(bus), request.date).await {
                    error!("failed to reconcile {}: {err:#}", request.date);
                }
            }
            Err(err) => error!("failed to read reconcile request: {err:#}"),
        }
    }
}

async fn reconcile(
    store: &PgCollectionStore,
    config: &ServiceConfig,
    bus: Option<&RedisBus>,
    date: NaiveDate,
) -> Result<ReconcileSummary> {
    let summary = BatchReconciler::new(store)
        .with_concurrency(config.reconcile_concurrency)
        .reconcile_day(date)
        .await
        .with_context(|| format!("failed to list payments for {date}"))?;

    if let Some(bus) = bus {
        let event = AttributionRunCompleted::from_summary(&summary, Utc::now());
        if let Err(err) = bus.publish_run_completed(&event).await {
            error!("failed to publish run summary for {date}: {err:#}");
        }
    }

    Ok(summary)
}

impl Commands {
    /// Fills in the default date: yesterday for runs and reports, today for
    /// roster freezes.
    fn with_default_dates(self, today: NaiveDate) -> Job {
        let yesterday = today - Duration::days(1);
        match self {
            Commands::Reconcile { date } => Job::Reconcile(date.unwrap_or(yesterday)),
            Commands::Freeze { campaign_id, date } => Job::Freeze {
                campaign_id,
                date: date.unwrap_or(today),
            },
            Commands::Report { date } => Job::Report(date.unwrap_or(yesterday)),
            Commands::Listen => Job::Listen,
        }
    }
}
