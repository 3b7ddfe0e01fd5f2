use clap::Parser;
use fantasy_pipeline::logging::initialize_logging;
use fantasy_pipeline::{
    FantasyPipeline, InvocationEvent, InvocationResponse, PipelineConfig, PipelineError,
};
use std::path::PathBuf;
use tracing::{info, warn};

/// Fetch, score and store one week of NFL fantasy stats
#[derive(Parser, Debug)]
#[command(name = "fantasy-pipeline", version)]
struct Args {
    /// NFL week; defaults to the provider's current week
    #[arg(long)]
    week: Option<i32>,

    /// Season year; defaults to sportsdataio.default_season
    #[arg(long)]
    year: Option<i32>,

    /// Read the invocation event from a JSON file instead of --week/--year
    #[arg(long, conflicts_with_all = ["week", "year"])]
    event: Option<PathBuf>,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let response = match invoke(&args).await {
        Ok(response) => response,
        Err(e) => InvocationResponse::from_error(&e),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Every failure up to and including the run itself ends up in the response
async fn invoke(args: &Args) -> Result<InvocationResponse, PipelineError> {
    let config = PipelineConfig::load(args.config.as_deref())?;
    if let Err(e) = initialize_logging(&config.logging) {
        warn!("{}", e);
    }

    let event = match &args.event {
        Some(path) => InvocationEvent::from_file(path)?,
        None => InvocationEvent {
            week: args.week,
            year: args.year,
            ..InvocationEvent::default()
        },
    };

    info!("Fantasy pipeline started");
    info!("Event: {}", serde_json::to_string(&event)?);

    let pipeline = FantasyPipeline::from_config(config)?;
    Ok(pipeline.handle(&event).await)
}
