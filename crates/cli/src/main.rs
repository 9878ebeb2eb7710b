use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use mayors_core::config::ScraperConfig;
use mayors_core::extract::Extractor;
use mayors_core::fetch::{CachedFetcher, Fetch, HttpFetcher};
use mayors_core::subdivision::{self, SUBDIVISIONS};
use mayors_core::writer::{self, OutputFormat, OutputTarget};
use schemars::schema_for;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mayors")]
#[command(about = "Scrape the US Conference of Mayors directory to CSV or JSON", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    scrape: ScrapeArgs,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Args)]
struct ScrapeArgs {
    /// Output file, or - for standard output
    #[arg(default_value = "-")]
    out: String,

    /// Output format (default: from the file extension, csv for stdout)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Two-letter codes to scrape (default: all)
    #[arg(long = "state", num_args = 1..)]
    states: Vec<String>,

    /// Append to an existing CSV, skipping records already in it
    #[arg(long)]
    append: bool,

    /// Serve same-day results from this directory instead of the network
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List known state and territory codes
    States,
    /// Export canonical JSON Schemas
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export the MayorRecord JSON Schema
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::States) => list_states(),
        Some(Commands::Schema { command }) => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
        None => run_scrape(cli.scrape),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_scrape(args: ScrapeArgs) -> Result<()> {
    // Everything that can be rejected is checked before the first request
    let target = OutputTarget::parse(&args.out);
    let format = target.resolve_format(args.format)?;
    let subdivisions = subdivision::resolve(&args.states)?;
    let config = match &args.config {
        Some(path) => ScraperConfig::load(path)?,
        None => ScraperConfig::default(),
    };
    let extractor = Extractor::new(&config.source.base_url)?;
    let http = HttpFetcher::new(&config.source)?;
    let fetcher: Box<dyn Fetch> = match args.cache_dir.or(config.cache.dir) {
        Some(dir) => Box::new(CachedFetcher::new(http, dir)),
        None => Box::new(http),
    };

    let mut sink = writer::open_sink(&target, format, args.append)?;
    let summary = mayors_core::scrape::scrape(fetcher.as_ref(), &extractor, &subdivisions, sink.as_mut())?;
    sink.finish()?;

    info!(
        subdivisions = summary.subdivisions,
        written = summary.written,
        duplicates = summary.duplicates,
        vacant = summary.vacant,
        skipped = summary.skipped,
        "scrape complete"
    );
    Ok(())
}

fn list_states() -> Result<()> {
    for sub in SUBDIVISIONS {
        println!("{},{}", sub.code, sub.name);
    }
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    let record_schema = schema_for!(mayors_core::schema::MayorRecord);
    let record_json = serde_json::to_string_pretty(&record_schema)?;
    fs::write(out_dir.join("MayorRecord.schema.json"), record_json)?;

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}
