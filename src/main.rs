//! Fic-Harvest main entry point
//!
//! This is the command-line interface for the fic-harvest corpus pipeline.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use fic_harvest::config::{load_config_with_hash, Config};
use fic_harvest::crawler::{build_corpus, BuildOutcome, HttpFetcher, OverwriteConfirm};
use fic_harvest::filter::run_filter_stage;
use fic_harvest::output::{
    corpus_statistics, load_stage, print_build_report, print_filter_stats, print_resolve_report,
    print_statistics, Stage,
};
use fic_harvest::tags::{run_dataset_stage, run_tag_stage};
use fic_harvest::HarvestError;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Fic-Harvest: a resumable fandom corpus harvester
///
/// Fic-Harvest walks the work listing of one category on an archive site,
/// extracts every work into a structured record, filters the corpus, and
/// canonicalizes its tags against the archive's own tag pages.
#[derive(Parser, Debug)]
#[command(name = "fic-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable fandom corpus harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the corpus, resuming from a checkpoint when one exists
    Download(DownloadArgs),

    /// Write the filtered corpus
    Filter,

    /// Resolve tags and write the canonical corpus
    Tags,

    /// Prune rare tags and write the dataset
    Dataset,

    /// Run download, filter, tags and dataset in order
    Run(DownloadArgs),

    /// Show statistics for a corpus file and exit
    Stats {
        /// Which snapshot to summarize
        #[arg(long, value_enum, default_value_t = Stage::Corpus)]
        stage: Stage,
    },

    /// Validate config and show the planned run without fetching anything
    Check,
}

#[derive(clap::Args, Debug)]
struct DownloadArgs {
    /// Ignore any checkpoint and start from an empty corpus
    #[arg(long)]
    fresh: bool,

    /// Replace an existing corpus without asking
    #[arg(short, long)]
    yes: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Download(args) => {
            handle_download(&config, &args).await?;
        }
        Command::Filter => handle_filter(&config)?,
        Command::Tags => handle_tags(&config).await?,
        Command::Dataset => handle_dataset(&config)?,
        Command::Run(args) => {
            if handle_download(&config, &args).await? {
                handle_filter(&config)?;
                handle_tags(&config).await?;
                handle_dataset(&config)?;
            }
        }
        Command::Stats { stage } => handle_stats(&config, stage)?,
        Command::Check => handle_check(&config)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fic_harvest=info,warn"),
            1 => EnvFilter::new("fic_harvest=debug,info"),
            2 => EnvFilter::new("fic_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Asks on the terminal before an existing corpus is replaced
struct TerminalConfirm {
    assume_yes: bool,
}

impl OverwriteConfirm for TerminalConfirm {
    fn confirm_overwrite(&mut self, final_path: &Path) -> fic_harvest::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }

        Confirm::new()
            .with_prompt(format!(
                "{} already exists. Download the whole corpus again?",
                final_path.display()
            ))
            .default(false)
            .interact()
            .map_err(|e| HarvestError::Prompt(e.to_string()))
    }
}

fn http_fetcher(config: &Config) -> anyhow::Result<HttpFetcher> {
    HttpFetcher::from_config(&config.user_agent, &config.crawler)
        .context("failed to build HTTP client")
}

/// Handles `download`; returns false when the user kept the existing corpus
async fn handle_download(config: &Config, args: &DownloadArgs) -> anyhow::Result<bool> {
    if args.fresh {
        tracing::info!("Starting fresh download (ignoring any checkpoint)");
    } else {
        tracing::info!("Starting download (will resume from a checkpoint if one exists)");
    }

    let fetcher = http_fetcher(config)?;
    let mut confirm = TerminalConfirm {
        assume_yes: args.yes,
    };

    match build_corpus(config, &fetcher, &mut confirm, args.fresh)
        .await
        .context("download failed")?
    {
        BuildOutcome::Committed(report) => {
            print_build_report(&report);
            Ok(true)
        }
        BuildOutcome::Declined => {
            println!("Existing corpus kept; nothing downloaded.");
            Ok(false)
        }
    }
}

fn handle_filter(config: &Config) -> anyhow::Result<()> {
    let stats = run_filter_stage(config).context("filter stage failed")?;
    print_filter_stats(&stats);
    Ok(())
}

async fn handle_tags(config: &Config) -> anyhow::Result<()> {
    let fetcher = http_fetcher(config)?;
    let report = run_tag_stage(config, &fetcher)
        .await
        .context("tag stage failed")?;
    print_resolve_report(&report);
    Ok(())
}

fn handle_dataset(config: &Config) -> anyhow::Result<()> {
    let dataset = run_dataset_stage(config).context("dataset stage failed")?;
    println!("✓ Dataset of {} works written", dataset.len());
    Ok(())
}

/// Handles `stats`: summarizes one corpus snapshot
fn handle_stats(config: &Config, stage: Stage) -> anyhow::Result<()> {
    let paths = config.paths();
    println!("Corpus file: {}\n", stage.path(&paths).display());

    let corpus = load_stage(stage, &paths).context("failed to load corpus")?;
    print_statistics(&corpus_statistics(&corpus));
    Ok(())
}

/// Handles `check`: validates config and shows what a run would do
fn handle_check(config: &Config) -> anyhow::Result<()> {
    println!("=== Fic-Harvest Check ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.base_url()?);
    println!("  Category: {}", config.site.category);
    println!("  Listing: {}", config.listing_url()?);

    println!("\nCrawler Configuration:");
    match config.crawler.max_pages {
        Some(pages) => println!("  Max pages: {}", pages),
        None => println!("  Max pages: all"),
    }
    println!(
        "  Checkpoint interval: {} works",
        config.crawler.checkpoint_interval
    );
    println!("  Request delay: {}ms", config.crawler.request_delay);
    match config.crawler.request_timeout {
        Some(secs) => println!("  Request timeout: {}s", secs),
        None => println!("  Request timeout: none"),
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    let filter = &config.filter;
    println!("\nFilter:");
    if filter.restrict_language {
        println!("  Language: {}", filter.language);
    } else {
        println!("  Language: any");
    }
    println!("  No crossovers: {}", filter.no_crossover);
    println!("  Single chapter: {}", filter.single_chapter);
    println!("  Complete only: {}", filter.complete);
    println!("  Minimum age: {} days", filter.minimum_age_days);
    println!("  Minimum tag uses: {}", filter.min_tag_uses);
    println!("  Omitted tags ({}):", filter.omit_tags.len());
    for tag in &filter.omit_tags {
        println!("    - {}", tag);
    }

    let paths = config.paths();
    println!("\nFiles:");
    println!("  Checkpoint: {}", paths.checkpoint.display());
    println!("  Corpus: {}", paths.corpus.display());
    println!("  Filtered: {}", paths.filtered.display());
    println!("  Canonical: {}", paths.canonical.display());
    println!("  Dataset: {}", paths.dataset.display());
    println!("  Tag cache: {}", paths.tag_cache.display());

    println!("\n✓ Configuration is valid");
    if paths.checkpoint.exists() {
        println!("✓ Would resume from {}", paths.checkpoint.display());
    } else if paths.corpus.exists() {
        println!(
            "✓ {} exists; download would ask before replacing it",
            paths.corpus.display()
        );
    } else {
        println!("✓ Would start a fresh download");
    }

    Ok(())
}
