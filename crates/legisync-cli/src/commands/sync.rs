//! The `sync` command: run the incremental synchronization engine.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use legisync_client::CongressClient;
use legisync_core::config::{ClientConfig, Component, InferenceConfig, SyncParams};
use legisync_core::keywords::KeywordTable;
use legisync_core::model::Chamber;
use legisync_db::{DryRunGateway, PersistenceGateway, SqliteGateway};
use legisync_engine::SyncOrchestrator;

use crate::output;

#[derive(Args)]
pub struct SyncArgs {
    /// Congress number to synchronize (e.g. 118)
    #[arg(long)]
    pub congress: i64,

    /// Restrict to one chamber: house, senate, or joint
    #[arg(long)]
    pub chamber: Option<String>,

    /// Days of remote changes to consider
    #[arg(long, default_value_t = 7)]
    pub lookback_days: u32,

    /// Components to sync (comma-separated): committees, members, hearings
    #[arg(long, value_delimiter = ',', default_values_t = ["committees".to_string(), "members".to_string(), "hearings".to_string()])]
    pub components: Vec<String>,

    /// Compute the changeset and inference decisions without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Abort waiting operations after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// API key for the upstream source
    #[arg(long, env = "CONGRESS_API_KEY")]
    pub api_key: String,

    /// Outbound request budget per hour
    #[arg(long, default_value_t = 5000)]
    pub requests_per_hour: u32,

    /// Concurrently applied records per unit of work
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Hearings processed between inference checkpoints
    #[arg(long, default_value_t = 25)]
    pub inference_batch: usize,

    /// Inference acceptance threshold
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f64,

    /// Weight of the proximity signal
    #[arg(long, default_value_t = 0.6)]
    pub proximity_weight: f64,

    /// Weight of the keyword signal
    #[arg(long, default_value_t = 0.4)]
    pub keyword_weight: f64,

    /// Event-id radius for the proximity signal
    #[arg(long, default_value_t = 100)]
    pub proximity_radius: i64,

    /// Override the curated keyword table with a TOML file
    #[arg(long)]
    pub keywords_file: Option<std::path::PathBuf>,
}

pub async fn execute(args: SyncArgs, db_path: &Path) -> Result<()> {
    let pool = legisync_db::open(db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;
    let sqlite = SqliteGateway::new(pool);

    let chamber = match &args.chamber {
        None => None,
        Some(raw) => Some(
            Chamber::from_str(raw)
                .with_context(|| format!("unknown chamber '{}'", raw))?,
        ),
    };
    let mut components = Vec::new();
    for raw in &args.components {
        components.push(
            Component::from_str(raw).with_context(|| format!("unknown component '{}'", raw))?,
        );
    }

    let params = SyncParams {
        congress: args.congress,
        chamber,
        lookback_days: args.lookback_days,
        components,
        dry_run: args.dry_run,
        concurrency: args.concurrency,
        inference_batch: args.inference_batch,
    };
    let client_config = ClientConfig {
        api_key: args.api_key.clone(),
        requests_per_hour: args.requests_per_hour,
        ..ClientConfig::default()
    };
    let inference = InferenceConfig {
        proximity_radius: args.proximity_radius,
        proximity_weight: args.proximity_weight,
        keyword_weight: args.keyword_weight,
        threshold: args.threshold,
    };
    let keywords = match &args.keywords_file {
        Some(path) => KeywordTable::from_file(path)?,
        None => KeywordTable::builtin(),
    };

    let source = Arc::new(CongressClient::new(client_config));

    let dry_gateway = if args.dry_run {
        Some(Arc::new(DryRunGateway::new(sqlite.clone())))
    } else {
        None
    };
    let gateway: Arc<dyn PersistenceGateway> = match &dry_gateway {
        Some(dry) => dry.clone(),
        None => Arc::new(sqlite),
    };

    let mut orchestrator = SyncOrchestrator::new(source, gateway, params)
        .with_inference(inference, Arc::new(keywords));
    if let Some(secs) = args.deadline_secs {
        orchestrator = orchestrator
            .with_deadline(tokio::time::Instant::now() + tokio::time::Duration::from_secs(secs));
    }

    // Ctrl-C requests cooperative cancellation: the in-flight unit finishes
    // and checkpoints, then the run winds down resumable.
    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("cancellation requested, finishing in-flight work");
            cancel.cancel();
        }
    });

    let summary = orchestrator.run().await;
    output::print_summary(&summary);

    if let Some(dry) = dry_gateway {
        output::print_planned_writes(&dry.planned_writes());
    }

    if summary.has_failures() {
        bail!("sync completed with failed phases; checkpoints retained for resume");
    }
    Ok(())
}
