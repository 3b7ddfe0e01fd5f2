use anyhow::{Context, Result};
use clap::Parser;
use fantasy_pipeline::logging::initialize_logging;
use fantasy_pipeline::normalizer::normalize_all;
use fantasy_pipeline::{calculate_fantasy_points, PipelineConfig, SportsDataIOFetcher, StatSource};
use std::path::PathBuf;

/// Fetch and score one week of stats and save them as JSON, without touching the database
#[derive(Parser, Debug)]
#[command(name = "fetch-stats")]
struct Args {
    #[arg(long)]
    week: Option<i32>,

    #[arg(long)]
    year: Option<i32>,

    #[arg(long, default_value = "sportsdata_fantasy.json")]
    output: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = PipelineConfig::load(args.config.as_deref())?;
    initialize_logging(&config.logging)?;

    let season = args.year.unwrap_or(config.sportsdataio.default_season);
    let fetcher = SportsDataIOFetcher::new(&config)?;

    println!("🏈 Fetching fantasy data from SportsData.io API...");

    let week = fetcher
        .fetch_week(season, args.week.filter(|w| *w != 0))
        .await
        .context("Failed to fetch weekly stats")?;

    println!("📊 Got stats for Season {}, Week {}", week.season, week.week);

    let mut records = normalize_all(&week.rows, week.week, week.season, fetcher.label());
    for record in &mut records {
        record.stats.fantasy_points = Some(calculate_fantasy_points(&record.stats.line));
    }

    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(&args.output, json)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    println!("💾 Saved {} records to {}", records.len(), args.output.display());

    println!("\n📈 Sample players:");
    for record in records.iter().take(5) {
        println!(
            "  {} ({}, {}) - {:.1} pts",
            record.name,
            record.team,
            record.position,
            record.stats.fantasy_points.unwrap_or_default()
        );
    }

    Ok(())
}
