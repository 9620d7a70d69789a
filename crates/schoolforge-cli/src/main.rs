mod logging;

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;
use tracing::{info, warn};

use schoolforge_core::SimulationConfig;
use schoolforge_sim::output::{DEFAULT_RETRIES, export_dataset};
use schoolforge_sim::{SimulationEngine, SimulationError};

#[derive(Debug, Error)]
enum CliError {
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("core error: {0}")]
    Core(#[from] schoolforge_core::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "schoolforge", version, about = "Synthetic multi-year school dataset generator")]
struct Cli {
    /// Total student population, kept stable across years.
    #[arg(long, default_value_t = 800)]
    population: u32,
    /// Number of grades; the last grade graduates.
    #[arg(long, default_value_t = 8)]
    grades: u8,
    /// Classes per grade (labeled A, B, ...).
    #[arg(long, default_value_t = 4)]
    classes: u8,
    /// First simulated academic year.
    #[arg(long)]
    start_year: i32,
    /// Last simulated academic year (inclusive).
    #[arg(long)]
    end_year: i32,
    /// Subject pool, comma separated (at least 5 distinct names).
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "Mathematics,English,Science,History,Geography,Art"
    )]
    subjects: Vec<String>,
    /// The 3 mandatory subjects, comma separated, drawn from the pool.
    #[arg(long, value_delimiter = ',', default_value = "Mathematics,English,Science")]
    mandatory: Vec<String>,
    /// Seed for reproducible runs; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Directory where run artifacts are written.
    #[arg(long, default_value = "runs")]
    out_dir: PathBuf,
    /// Attempts per table when the export target is locked.
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    retries: u32,
}

fn main() -> Result<(), CliError> {
    logging::init().map_err(CliError::Logging)?;
    run(Cli::parse())
}

fn run(args: Cli) -> Result<(), CliError> {
    let config = SimulationConfig {
        population: args.population,
        grade_count: args.grades,
        classes_per_grade: args.classes,
        start_year: args.start_year,
        end_year: args.end_year,
        subjects: args.subjects,
        mandatory_subjects: args.mandatory,
        seed: args.seed,
    };

    let engine = SimulationEngine::new(config)?;
    let dataset = engine.run()?;

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let run_dir = args
        .out_dir
        .join(format!("{timestamp}__run_{}", uuid::Uuid::new_v4()));
    let report = export_dataset(&run_dir, &dataset, args.retries)?;

    if report.skipped.is_empty() {
        info!(
            run_dir = %run_dir.display(),
            students = dataset.students.len(),
            academic_records = dataset.academics.len(),
            graduates = dataset.graduates.len(),
            terminated = dataset.terminated.len(),
            "run complete"
        );
    } else {
        warn!(
            run_dir = %run_dir.display(),
            skipped = report.skipped.join(", "),
            "run complete with skipped tables"
        );
    }
    Ok(())
}
