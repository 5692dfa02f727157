use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use placescout_client::{GooglePlacesClient, KeyCheck, PlacesConfig, ReqwestPageFetcher};
use placescout_core::checkpoint::CheckpointManager;
use placescout_core::fields::{Field, FieldSelection};
use placescout_core::output::OutputFormat;
use placescout_core::pacer::PacingConfig;
use placescout_core::pipeline::{
    HarvestPipeline, RunRequest, RunStatus, RunSummary, TracingReporter,
};
use placescout_core::query::expand_phrases;
use placescout_core::ratelimit::{RateLimitConfig, RateLimitedApi};
use placescout_core::util::destination_path;

#[derive(Parser)]
#[command(
    name = "placescout",
    version,
    about = "Collect business listings from Google Places into JSON or CSV"
)]
struct Cli {
    /// Write logs to this file instead of stderr (no colours)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, deduplicate, fetch details and append to the destination file
    Run(RunArgs),

    /// Check that an API key is accepted by the Places API
    ValidateKey {
        /// API key (reads from PLACES_API_KEY env var if not provided)
        #[arg(short, long, env = "PLACES_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Print the checkpoint left by an interrupted run, if any
    Checkpoint {
        /// Data directory holding the checkpoint
        #[arg(long, env = "PLACESCOUT_DATA_DIR")]
        data_dir: Option<PathBuf>,
    },

    /// List the selectable output fields
    Fields,
}

#[derive(Args)]
struct RunArgs {
    /// Search phrases separated by newlines, commas or semicolons
    #[arg(short, long, required_unless_present = "phrases_file")]
    phrases: Option<String>,

    /// File with one search phrase per line
    #[arg(long)]
    phrases_file: Option<PathBuf>,

    /// Destination file name (defaults to "<first phrase>-data")
    #[arg(short, long)]
    output: Option<String>,

    /// Output format: json or csv
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Directory for destination files and the run checkpoint
    #[arg(long, env = "PLACESCOUT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Comma-separated fields to collect (see `placescout fields`)
    #[arg(long)]
    fields: Option<String>,

    /// Maximum results per phrase (0 = no limit)
    #[arg(long)]
    cap: Option<usize>,

    /// Minimum seconds between detail lookups
    #[arg(long, default_value_t = 1.5)]
    min_delay: f64,

    /// Maximum seconds between detail lookups
    #[arg(long, default_value_t = 3.0)]
    max_delay: f64,

    /// Lookups per batch before a longer pause
    #[arg(long, default_value_t = 5)]
    batch_size: usize,

    /// Base seconds of the pause between batches
    #[arg(long, default_value_t = 10.0)]
    batch_delay: f64,

    /// API key (reads from PLACES_API_KEY env var if not provided)
    #[arg(short, long, env = "PLACES_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Skip the API key probe before the run
    #[arg(long, default_value_t = false)]
    skip_key_check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let config = PlacesConfig::from_env()?;

    match cli.command {
        Commands::Run(args) => cmd_run(args, config).await?,
        Commands::ValidateKey { api_key } => {
            let config = PlacesConfig {
                api_key: api_key.or(config.api_key),
                ..config
            };
            let client = GooglePlacesClient::from_config(&config)?;
            check_key(&client).await?;
            println!("API key is valid");
        }
        Commands::Checkpoint { data_dir } => {
            cmd_checkpoint(&data_dir.unwrap_or(config.data_dir))?;
        }
        Commands::Fields => cmd_fields(),
    }

    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("placescout=info".parse()?);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn cmd_run(args: RunArgs, config: PlacesConfig) -> Result<()> {
    // 1. Phrases
    let mut text = args.phrases.unwrap_or_default();
    if let Some(path) = &args.phrases_file {
        let file_text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read phrases file: {}", path.display()))?;
        text.push('\n');
        text.push_str(&file_text);
    }
    let phrases = expand_phrases(&text);
    if phrases.is_empty() {
        bail!("No search phrases given");
    }

    // 2. Output settings
    let format: OutputFormat = args.format.parse()?;
    let selection = match &args.fields {
        Some(list) => FieldSelection::parse(list)?,
        None => FieldSelection::default(),
    };
    let pacing = PacingConfig {
        min_delay: seconds("--min-delay", args.min_delay)?,
        max_delay: seconds("--max-delay", args.max_delay)?,
        batch_size: args.batch_size,
        batch_delay: seconds("--batch-delay", args.batch_delay)?,
    };
    pacing.validate()?;

    let data_dir = args.data_dir.unwrap_or_else(|| config.data_dir.clone());
    let destination = destination_path(&data_dir, args.output.as_deref(), &phrases[0], format);

    // 3. Upstream clients
    let config = PlacesConfig {
        api_key: args.api_key.or(config.api_key),
        ..config
    };
    let client = GooglePlacesClient::from_config(&config)?;
    if args.skip_key_check {
        tracing::info!("Skipping API key check");
    } else {
        check_key(&client).await?;
    }
    let api = RateLimitedApi::new(client, RateLimitConfig::default());
    let fetcher = ReqwestPageFetcher::new().context("Failed to create HTTP client")?;

    // 4. Ctrl-C stops after the current item and still saves
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current item");
            on_interrupt.cancel();
        }
    });

    tracing::info!(
        phrases = phrases.len(),
        destination = %destination.display(),
        fields = ?selection.output_keys(),
        "Starting run"
    );

    let request = RunRequest {
        phrases,
        destination: destination.clone(),
        format,
        selection,
        cap: args.cap,
        pacing,
        data_dir,
    };
    let summary = HarvestPipeline::new(api, fetcher)
        .run(request, cancel, &TracingReporter)
        .await?;

    print_summary(&summary, &destination);
    Ok(())
}

fn seconds(flag: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("{flag} must be a non-negative number of seconds, got {value}"))
}

async fn check_key(client: &GooglePlacesClient) -> Result<()> {
    match client.validate_key().await? {
        KeyCheck::Valid => {
            tracing::info!("API key accepted");
            Ok(())
        }
        KeyCheck::Invalid(reason) => bail!("API key rejected: {reason}"),
        KeyCheck::Inconclusive(status) => bail!("Could not validate API key: {status}"),
    }
}

fn print_summary(summary: &RunSummary, destination: &Path) {
    let status = match summary.status {
        RunStatus::Completed => "completed",
        RunStatus::NothingNew if summary.raw_found == 0 => "nothing found",
        RunStatus::NothingNew => "nothing new",
        RunStatus::Cancelled => "cancelled (partial results saved)",
    };

    println!("Run {status}\n");
    println!("  Phrases searched:  {}", summary.phrases_searched);
    println!("  Listings found:    {}", summary.raw_found);
    println!("  New listings:      {}", summary.unique_new);
    println!("  Records written:   {}", summary.written);
    if let Some(total) = summary.total_in_file {
        println!("  Total in file:     {total} ({})", destination.display());
    }
    println!("  API calls:         {}", summary.api_calls);
    println!("  Estimated cost:    ${:.2}", summary.estimated_cost);
}

fn cmd_checkpoint(data_dir: &Path) -> Result<()> {
    let manager = CheckpointManager::new(data_dir);
    match manager.load()? {
        None => println!("No checkpoint in {}", data_dir.display()),
        Some(checkpoint) => {
            println!("Checkpoint at {}:\n", manager.path().display());
            println!("  Destination:       {}", checkpoint.filename);
            println!("  Processed:         {}", checkpoint.processed_count);
            println!("  Records collected: {}", checkpoint.scraped_data_count);
            match checkpoint.saved_at() {
                Some(at) => println!("  Saved at:          {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
                None => println!("  Saved at:          {}", checkpoint.timestamp),
            }
            println!("\nRe-running the same phrases skips everything already in the destination.");
        }
    }
    Ok(())
}

fn cmd_fields() {
    println!("{:<15} {:<15} default", "field", "output key");
    for field in Field::ALL {
        let default = if field.default_selected() { "yes" } else { "no" };
        println!("{:<15} {:<15} {default}", field.as_str(), field.output_key());
    }
    println!("\nSelecting email probes each listing's website; its key is added to the request only.");
}
