use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use shopflow_core::config::DatabaseConfig;
use shopflow_core::db::{self, DbPool};
use shopflow_core::dimensions::DimensionLoader;
use shopflow_core::facts::FactLoader;
use shopflow_core::generator::{self, GeneratorConfig};
use shopflow_core::quality::{QualityChecker, QualityReport};
use shopflow_core::staging::StagingLoader;

mod report;

#[derive(Parser, Debug)]
#[command(author, version, about = "E-commerce warehouse ETL pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the staging and warehouse schemas (runs database migrations)
    Migrate,
    /// Generate deterministic sample CSV extracts
    Generate(GenerateArgs),
    /// Load CSV extracts into the staging schema, replacing prior contents
    Stage(StageArgs),
    /// Populate warehouse dimensions from staging
    Dimensions(DimensionArgs),
    /// Populate warehouse fact tables from staging
    Facts,
    /// Run data quality checks and print the report
    Check(CheckArgs),
    /// Run the full pipeline: stage, dimensions, facts, quality checks
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Directory the CSV extracts are written to
    #[arg(long, default_value = "data/raw")]
    dir: PathBuf,
    #[arg(long, default_value_t = 5000)]
    customers: usize,
    #[arg(long, default_value_t = 500)]
    products: usize,
    #[arg(long, default_value_t = 20000)]
    orders: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args, Debug)]
struct StageArgs {
    /// Directory holding the CSV extracts
    #[arg(long, default_value = "data/raw")]
    dir: PathBuf,
}

#[derive(Args, Debug)]
struct DimensionArgs {
    /// First day of the pre-generated date dimension range
    #[arg(long, default_value = "2022-01-01")]
    start: NaiveDate,
    /// Last day of the pre-generated date dimension range (inclusive)
    #[arg(long, default_value = "2025-12-31")]
    end: NaiveDate,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long, default_value = "data/raw")]
    dir: PathBuf,
    #[arg(long, default_value = "2022-01-01")]
    start: NaiveDate,
    #[arg(long, default_value = "2025-12-31")]
    end: NaiveDate,
    /// Print the quality report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// What a finished invocation means for the process exit status. Quality
/// failures are a distinct, non-crash outcome.
enum Outcome {
    Clean,
    QualityFailed,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match dispatch().await {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        Ok(Outcome::QualityFailed) => {
            warn!("Some data quality checks failed");
            ExitCode::from(1)
        }
        Err(err) => {
            error!("Pipeline failed: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn dispatch() -> Result<Outcome> {
    let cli = Cli::parse();

    match cli.command {
        Command::Migrate => {
            let pool = connect_pool().await?;
            db::run_migrations(&pool).await?;
            info!("Database migrations applied");
            Ok(Outcome::Clean)
        }
        Command::Generate(args) => {
            let config = GeneratorConfig {
                customers: args.customers,
                products: args.products,
                orders: args.orders,
                seed: args.seed,
            };
            generator::generate_all(&config, &args.dir)?;
            Ok(Outcome::Clean)
        }
        Command::Stage(args) => {
            let pool = connect_pool().await?;
            run_stage(&pool, &args.dir).await?;
            Ok(Outcome::Clean)
        }
        Command::Dimensions(args) => {
            let pool = connect_pool().await?;
            run_dimensions(&pool, args.start, args.end).await?;
            Ok(Outcome::Clean)
        }
        Command::Facts => {
            let pool = connect_pool().await?;
            run_facts(&pool).await?;
            Ok(Outcome::Clean)
        }
        Command::Check(args) => {
            let pool = connect_pool().await?;
            let report = run_checks(&pool, args.json).await?;
            Ok(outcome_for(&report))
        }
        Command::Run(args) => {
            let pool = connect_pool().await?;

            info!("Step 1/4: loading staging tables");
            run_stage(&pool, &args.dir).await?;

            info!("Step 2/4: populating dimensions");
            run_dimensions(&pool, args.start, args.end).await?;

            info!("Step 3/4: populating facts");
            run_facts(&pool).await?;

            info!("Step 4/4: running quality checks");
            let report = run_checks(&pool, args.json).await?;
            Ok(outcome_for(&report))
        }
    }
}

async fn connect_pool() -> Result<DbPool> {
    dotenvy::dotenv().ok();
    let url = DatabaseConfig::resolve_url()
        .context("DATABASE_URL or the DB_* variables must be set")?;
    db::connect_url(&url)
        .await
        .context("failed to connect to the warehouse database")
}

async fn run_stage(pool: &DbPool, dir: &std::path::Path) -> Result<()> {
    let summary = StagingLoader::new(pool).load_all_sources(dir).await?;
    info!(rows = summary.total_rows(), "Staging tables replaced");
    Ok(())
}

async fn run_dimensions(pool: &DbPool, start: NaiveDate, end: NaiveDate) -> Result<()> {
    DimensionLoader::new(pool)
        .load_all(start, end)
        .await
        .context("dimension load failed; ensure `shopflow migrate` and `shopflow stage` have run")?;
    Ok(())
}

async fn run_facts(pool: &DbPool) -> Result<()> {
    FactLoader::new(pool).load_all().await.context(
        "fact load failed; ensure `shopflow migrate`, `shopflow stage` and `shopflow dimensions` have run",
    )?;
    Ok(())
}

async fn run_checks(pool: &DbPool, json: bool) -> Result<QualityReport> {
    let report = QualityChecker::new(pool).run_all_checks().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report::render(&report));
    }
    Ok(report)
}

fn outcome_for(report: &QualityReport) -> Outcome {
    if report.all_passed() {
        Outcome::Clean
    } else {
        Outcome::QualityFailed
    }
}
