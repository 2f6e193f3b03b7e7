//! chmigrate CLI
//!
//! Command-line front end for the schema-migration diff engine.

mod config;
mod parser;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use chmigrate_core::interfaces::{ProjectLoader, SchemaParser};
use chmigrate_core::sumfile::{self, ValidationOutcome};
use chmigrate_core::DiffError;

use config::{FileProjectLoader, ProjectConfig};
use parser::FallbackParser;

/// Schema migrations for a ClickHouse-dialect column store.
#[derive(Parser)]
#[command(name = "chmigrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project's YAML config file.
    #[arg(short, long, default_value = "chmigrate.yaml")]
    config: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff the current migration state against an environment's target
    /// schema and print the forward/reverse SQL, without writing a file.
    Diff {
        /// Environment name from the project config.
        environment: String,
    },

    /// Same as `diff`, but writes the forward plan to a timestamped
    /// migration file in the environment's migrations directory.
    MakeMigration {
        /// Environment name from the project config.
        environment: String,
    },

    /// Migration-set hash operations (§4.7).
    Sum {
        #[command(subcommand)]
        action: SumCommand,
    },
}

#[derive(Subcommand)]
enum SumCommand {
    /// Recompute hashes for the environment's migrations directory and
    /// write (or overwrite) its sum file.
    Generate {
        /// Environment name from the project config.
        environment: String,
    },
    /// Validate the environment's migrations directory against its sum
    /// file without modifying anything.
    Verify {
        /// Environment name from the project config.
        environment: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).with_target(false).without_time().finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let project = ProjectConfig::load(&cli.config)?;
    let root = cli.config.parent().map(std::path::Path::to_path_buf).unwrap_or_default();

    match cli.command {
        Commands::Diff { environment } => run_diff(&project, &root, &environment, None),
        Commands::MakeMigration { environment } => {
            let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S").to_string();
            run_diff(&project, &root, &environment, Some(timestamp))
        }
        Commands::Sum { action } => run_sum(&project, &root, action),
    }
}

/// Loads the migration set currently on disk for `environment` (every
/// `.sql` file in its migrations directory, lexicographic order) and
/// parses it as the "current" schema; the entrypoint file (with imports
/// resolved) is the "target". Runs the full pipeline and either prints
/// the plan or, when `write_as` is set, writes it to a timestamped file.
fn run_diff(project: &ProjectConfig, root: &std::path::Path, environment: &str, write_as: Option<String>) -> anyhow::Result<()> {
    let env = project
        .environment(environment)
        .ok_or_else(|| anyhow::anyhow!("unknown environment {environment:?}"))?;

    let loader = FileProjectLoader { config: project, root: root.to_path_buf() };
    let target_sql = loader.load_entrypoint(environment)?;

    let migrations_dir = root.join(&env.migrations_dir);
    let current_sql = load_migration_set(&migrations_dir)?;

    let parser = FallbackParser;
    let current = parser.parse(&current_sql).map_err(|message| anyhow::anyhow!("failed to parse current schema: {message}"))?;
    let target = parser.parse(&target_sql).map_err(|message| anyhow::anyhow!("failed to parse target schema: {message}"))?;

    match chmigrate_core::diff(&current, &target) {
        Ok(plan) => {
            info!(
                "{} forward statement(s), {} reverse statement(s)",
                plan.forward_statements().len(),
                plan.reverse_statements().len()
            );
            if let Err(err) = plan.verify(&parser) {
                warn!("generated plan failed its re-parse self-check: {err}");
            }

            match write_as {
                Some(timestamp) => {
                    std::fs::create_dir_all(&migrations_dir)?;
                    let file_path = migrations_dir.join(format!("{timestamp}.sql"));
                    std::fs::write(&file_path, plan.forward_sql())?;
                    info!("wrote migration: {}", file_path.display());
                }
                None => {
                    println!("-- forward --\n{}\n\n-- reverse --\n{}", plan.forward_sql(), plan.reverse_sql());
                }
            }
            Ok(())
        }
        Err(DiffError::NoDifferences) => {
            info!("no differences between current and target schema");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn load_migration_set(migrations_dir: &std::path::Path) -> anyhow::Result<String> {
    if !migrations_dir.exists() {
        return Ok(String::new());
    }
    let mut entries: Vec<_> = std::fs::read_dir(migrations_dir)?
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.to_ascii_lowercase().ends_with(".sql") && !name.eq_ignore_ascii_case(sumfile::SUM_FILE_NAME)
        })
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut combined = String::new();
    for entry in entries {
        combined.push_str(&std::fs::read_to_string(entry.path())?);
        combined.push('\n');
    }
    Ok(combined)
}

fn run_sum(project: &ProjectConfig, root: &std::path::Path, action: SumCommand) -> anyhow::Result<()> {
    let (environment, generate) = match &action {
        SumCommand::Generate { environment } => (environment, true),
        SumCommand::Verify { environment } => (environment, false),
    };
    let env = project
        .environment(environment)
        .ok_or_else(|| anyhow::anyhow!("unknown environment {environment:?}"))?;
    let migrations_dir = root.join(&env.migrations_dir);

    if generate {
        let sum = sumfile::hash_directory(&migrations_dir)?;
        sumfile::write_sum_file(&migrations_dir, &sum)?;
        info!("wrote {} over {} migration file(s)", sumfile::SUM_FILE_NAME, sum.files.len());
        Ok(())
    } else {
        match sumfile::validate_directory(&migrations_dir)? {
            ValidationOutcome::Valid => {
                info!("migration set matches its sum file");
                Ok(())
            }
            ValidationOutcome::Absent => Err(anyhow::anyhow!("no {} found in {}", sumfile::SUM_FILE_NAME, migrations_dir.display())),
            ValidationOutcome::Mismatch => Err(anyhow::anyhow!("migration set does not match its sum file")),
        }
    }
}
