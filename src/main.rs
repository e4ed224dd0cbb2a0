use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use clinic_lib::classification::{run_classification, ClassificationPipeline, GroqClassifier};
use clinic_lib::models::core::RawRecord;
use clinic_lib::storage::{InMemoryRecordStore, JsonlRecordStore, RecordStore};
use clinic_lib::utils::config::{BatchConfig, RemoteClassifierConfig, DEFAULT_BATCH_DELAY_SECS, DEFAULT_BATCH_SIZE};
use clinic_lib::utils::env::load_env;
use clinic_lib::utils::progress_config::ProgressConfig;
use log::{info, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "Filters medical business listings down to private clinics")]
struct Args {
    /// JSON array of raw business records
    #[arg(short, long)]
    input: PathBuf,

    /// JSONL file accepted records are appended to
    #[arg(short, long, default_value = "data/clinics.jsonl")]
    output: PathBuf,

    /// Records classified concurrently per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Seconds to pause between batches
    #[arg(long, default_value_t = DEFAULT_BATCH_DELAY_SECS)]
    delay: f64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Classify without writing to the output file
    #[arg(long)]
    dry_run: bool,
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("hyper", LevelFilter::Warn)
        .init();
}

fn read_records(path: &PathBuf) -> Result<Vec<RawRecord>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read input file {}", path.display()))?;
    let records: Vec<RawRecord> =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse records from {}", path.display()))?;
    Ok(records)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    load_env();

    let batch = BatchConfig::new(args.batch_size, args.delay).context("Invalid batch settings")?;
    let remote_config = RemoteClassifierConfig::from_env().context("Remote classifier is not configured")?;
    remote_config.log_config();

    let progress_config = ProgressConfig::from_env();
    info!("Progress tracking: enabled={}", progress_config.enabled);

    let run_id = Uuid::new_v4().to_string();
    info!("Run {} started at {}", run_id, Utc::now().to_rfc3339());

    let records = read_records(&args.input)?;
    let classifier = GroqClassifier::new(remote_config).context("Failed to create remote classifier")?;
    let pipeline = ClassificationPipeline::new(Arc::new(classifier)).with_progress(progress_config);
    pipeline.logger().log_start(&run_id, records.len());

    let mut store: Box<dyn RecordStore> = if args.dry_run {
        info!("Dry run: accepted records will not be written");
        Box::new(InMemoryRecordStore::new())
    } else {
        let store = JsonlRecordStore::open(&args.output)
            .with_context(|| format!("Failed to open output store {}", args.output.display()))?;
        info!("Writing accepted records to {}", store.path().display());
        Box::new(store)
    };

    let stats = run_classification(records, store.as_mut(), &pipeline, &batch).await?;
    info!(
        "Run {} complete: {} kept, {} discarded, {} duplicates, {} already stored",
        run_id,
        stats.kept,
        stats.discarded(),
        stats.duplicates,
        stats.skipped_seen
    );
    Ok(())
}
