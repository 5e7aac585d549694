use std::error::Error;
use std::io;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use github_crawler_lib::{Args, RunPhase, SearchOrchestrator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    // Logs go to stderr; stdout carries the JSON results
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    dotenv().ok();

    let args = Args::parse();

    // Ask for anything not given on the command line
    let input = if args.is_complete() {
        args.resolve_input(&mut io::empty(), &mut io::sink())?
    } else {
        args.resolve_input(&mut io::stdin().lock(), &mut io::stdout())?
    };
    let config = args.config(&input)?;
    let orchestrator = SearchOrchestrator::new(config)?;

    let outcome = orchestrator.run(&input.query()).await;

    for failure in &outcome.failures {
        warn!("{failure}");
    }
    match outcome.phase {
        RunPhase::SearchFailed => error!("search failed, no results"),
        _ => info!(
            hits = outcome.hits_found,
            records = outcome.records.len(),
            failed = outcome.failures.len(),
            "crawl finished"
        ),
    }

    let json = outcome.to_json()?;
    println!("{json}");

    if let Some(path) = &args.output {
        tokio::fs::write(path, json.as_bytes()).await?;
        info!("Saved results to '{}'", path);
    }

    Ok(())
}
