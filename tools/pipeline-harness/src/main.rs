mod generator;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fantasy_pipeline::logging::initialize_logging;
use fantasy_pipeline::{
    FantasyPipeline, InMemoryStatStore, InvocationEvent, InvocationResponse, PipelineConfig,
    PipelineError, SportsDataIOFetcher, StatStore,
};
use generator::FixtureGenerator;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Local tooling for the fantasy pipeline: fixtures, test events and dry runs
#[derive(Parser)]
#[command(name = "pipeline-harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a synthetic week of player stats
    Generate {
        #[arg(long, default_value_t = 1)]
        week: i32,
        #[arg(long, default_value_t = 2024)]
        year: i32,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "test_fantasy_data.json")]
        output: PathBuf,
    },
    /// Write a test-mode invocation event carrying a synthetic week
    Event {
        #[arg(long, default_value_t = 1)]
        week: i32,
        #[arg(long, default_value_t = 2024)]
        year: i32,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "test_event.json")]
        output: PathBuf,
    },
    /// Run the pipeline locally against an event file
    Run {
        #[arg(long, default_value = "test_event.json")]
        event: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Persist into an in-memory store instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    match Cli::parse().command {
        Command::Generate { week, year, seed, output } => {
            let players = FixtureGenerator::new(seed).generate(week, year);
            write_json(&output, &players)?;
            println!("✅ Generated {} players for week {week}, {year}", players.len());
            println!("💾 Saved to {}", output.display());
        }
        Command::Event { week, year, seed, output } => {
            let event = InvocationEvent {
                test_mode: true,
                test_data: Some(FixtureGenerator::new(seed).generate(week, year)),
                ..InvocationEvent::for_week(week, year)
            };
            write_json(&output, &event)?;
            println!("✅ Test event saved to {}", output.display());
        }
        Command::Run { event, config, in_memory } => {
            run(&event, config.as_deref(), in_memory).await?;
        }
    }

    Ok(())
}

async fn run(event_path: &Path, config_path: Option<&Path>, in_memory: bool) -> Result<()> {
    println!("🚀 Running pipeline with {}", event_path.display());

    let memory_store = Arc::new(InMemoryStatStore::new());
    let store = in_memory.then(|| memory_store.clone());
    let response = match invoke(event_path, config_path, store).await {
        Ok(response) => response,
        Err(e) => InvocationResponse::from_error(&e),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.is_success() {
        println!("✅ Pipeline succeeded");
    } else {
        println!("❌ Pipeline failed with status {}", response.status_code);
    }

    if in_memory {
        if let Ok(counts) = memory_store.counts().await {
            println!(
                "📊 In-memory store: {} players, {} games, {} player stats",
                counts.players, counts.games, counts.player_stats
            );
        }
    }

    Ok(())
}

async fn invoke(
    event_path: &Path,
    config_path: Option<&Path>,
    memory_store: Option<Arc<InMemoryStatStore>>,
) -> Result<InvocationResponse, PipelineError> {
    let config = PipelineConfig::load(config_path)?;
    if let Err(e) = initialize_logging(&config.logging) {
        eprintln!("⚠️  {e}");
    }

    let event = InvocationEvent::from_file(event_path)?;

    let pipeline = match memory_store {
        Some(store) => {
            let source = Arc::new(SportsDataIOFetcher::new(&config)?);
            FantasyPipeline::new(config, source, store)
        }
        None => FantasyPipeline::from_config(config)?,
    };
    Ok(pipeline.handle(&event).await)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
