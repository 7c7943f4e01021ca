// src/main.rs
// =============================================================================
// This is the entry point of the mirroring tool.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the settings: defaults, then the config file, then the flags
// 3. Set up logging and the progress bars
// 4. Run the crawl and print the report
// 5. Exit with proper code (0 = mirror finished, 1 = error)
//
// Rust concepts used:
// - async/await: downloads inside a page run concurrently
// - Result<T, E>: errors bubble up to main with the ? operator
// - Generics: mirror_site works with any Fetch implementation
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli;      // src/cli.rs - command-line parsing
mod config;   // src/config.rs - settings and their sources
mod crawl;    // src/crawl/ - the mirror itself
mod logging;  // src/logging.rs - tracing setup

use anyhow::{Context, Result};
use clap::Parser; // Parser trait enables the parse() method
use tracing::error;

use cli::Cli;
use config::MirrorConfig;
use crawl::{CrawlReport, HttpFetcher, Progress};

// The #[tokio::main] attribute creates a tokio runtime and runs our async
// main inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            error!("{e:#}");
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {e:#}");
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose)?;

    let config = build_config(&cli)?;

    let fetcher = HttpFetcher::new(&config).context("building HTTP client")?;
    let progress = if cli.quiet { Progress::hidden() } else { Progress::new() };

    let report = crawl::mirror_site(&config, &fetcher, &progress).await?;

    print_report(&report, cli.json)?;
    Ok(())
}

// Defaults < config file < command-line flags
fn build_config(cli: &Cli) -> Result<MirrorConfig> {
    let mut config = match &cli.config {
        Some(path) => MirrorConfig::from_file(path)?,
        None => MirrorConfig::default(),
    };
    cli.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match report.total_pages {
        Some(total) => println!("Pages:            {} of {}", report.pages_written, total),
        None => println!("Pages:            {}", report.pages_written),
    }
    if report.pages_skipped > 0 {
        println!("Skipped pages:    {}", report.pages_skipped);
    }
    println!("Book/category:    {}", report.leaf_pages);
    println!("Images:           {}", report.assets);
    if report.failed_downloads > 0 {
        println!("Failed downloads: {}", report.failed_downloads);
    }

    println!(
        "Mirror completed! Files are saved in the '{}' directory.",
        report.output_dir.display()
    );
    Ok(())
}
