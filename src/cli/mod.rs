//! Command-line interface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};

use crate::analysis::brood::{BroodReport, shape_response};
use crate::config::Config;
use crate::history::{
    BroodPatternRecord, HealthAggregator, HistoryStore, QueenCellInput, QueenCellRecord,
    initialize_demo_data,
};
use crate::inference::{InferenceClient, encode_image};
use crate::server::{AppState, ModelCatalog};
use crate::storage::{FileBackend, StorageBackend};

/// Hive monitoring assistant.
#[derive(Parser, Debug)]
#[command(name = "ibrood", version, about = "Queen-cell and brood-pattern analysis for beekeepers")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP gateway
    Serve {
        /// Bind address, e.g. 127.0.0.1:3000
        #[arg(long, env = "IBROOD_BIND")]
        bind: Option<SocketAddr>,
    },

    /// Analyze a hive image and record the result
    Analyze {
        #[command(subcommand)]
        kind: AnalyzeCommand,
    },

    /// Inspect or edit the stored analysis history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Show the overall colony health overview
    Health,

    /// Populate the history with demo data (runs once)
    Seed,
}

#[derive(Subcommand, Debug)]
pub enum AnalyzeCommand {
    /// Detect queen cells in a frame image
    Queen {
        /// Path to the image file
        image: PathBuf,

        /// Print the result without saving it to history
        #[arg(long)]
        no_save: bool,
    },

    /// Assess the brood pattern in a frame image
    Brood {
        /// Path to the image file
        image: PathBuf,

        /// Print the result without saving it to history
        #[arg(long)]
        no_save: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List stored analyses, newest first
    List {
        /// Restrict to one kind
        #[arg(short, long)]
        kind: Option<Kind>,
    },

    /// Delete one record by id
    Delete {
        kind: Kind,
        id: String,
    },

    /// Remove stored records
    Clear {
        /// Restrict to one kind; clears both when omitted
        #[arg(short, long)]
        kind: Option<Kind>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Queen,
    Brood,
}

/// Start the gateway.
pub async fn run_serve(config: &Config, bind: Option<SocketAddr>) -> anyhow::Result<()> {
    let backend = open_backend(config)?;
    let inference = InferenceClient::new(config.inference.clone())?;
    let catalog = ModelCatalog::new(&config.models_dir);
    let state = AppState::new(backend, inference, catalog);

    let addr = bind.unwrap_or(config.bind);
    crate::server::serve(state, addr).await?;
    Ok(())
}

/// Analyze an image and (by default) save the result.
pub async fn run_analyze(config: &Config, cmd: AnalyzeCommand) -> anyhow::Result<()> {
    let backend = open_backend(config)?;
    let client = InferenceClient::new(config.inference.clone())?;

    match cmd {
        AnalyzeCommand::Queen { image, no_save } => {
            let encoded = encode_image(&image)?;
            let analysis = client.analyze_queen(&encoded).await;
            print_queen_analysis(&analysis);

            if !no_save {
                let record = HistoryStore::queen(backend).save(analysis);
                println!();
                println!("Saved as {}", record.id);
            }
        }
        AnalyzeCommand::Brood { image, no_save } => {
            let bytes = std::fs::read(&image)
                .map_err(|e| anyhow::anyhow!("failed to read image {}: {e}", image.display()))?;
            let response = client.detect_brood(bytes).await?;
            let report = shape_response(response);
            print_brood_report(&report);

            if !no_save {
                let record = HistoryStore::brood(backend).save(report.input);
                println!();
                println!("Saved as {}", record.id);
            }
        }
    }
    Ok(())
}

/// Inspect or edit the stored history.
pub fn run_history(config: &Config, cmd: HistoryCommand) -> anyhow::Result<()> {
    let backend = open_backend(config)?;
    let queen = HistoryStore::queen(backend.clone());
    let brood = HistoryStore::brood(backend);

    match cmd {
        HistoryCommand::List { kind } => {
            if kind.is_none() || kind == Some(Kind::Queen) {
                println!("--- QUEEN CELL ANALYSES ---");
                for record in queen.list() {
                    print_queen_record(&record);
                }
            }
            if kind.is_none() || kind == Some(Kind::Brood) {
                println!("--- BROOD PATTERN ANALYSES ---");
                for record in brood.list() {
                    print_brood_record(&record);
                }
            }
        }
        HistoryCommand::Delete { kind, id } => {
            match kind {
                Kind::Queen => queen.delete(&id),
                Kind::Brood => brood.delete(&id),
            }
            println!("Deleted {id}");
        }
        HistoryCommand::Clear { kind } => {
            match kind {
                Some(Kind::Queen) => queen.clear(),
                Some(Kind::Brood) => brood.clear(),
                None => {
                    queen.clear();
                    brood.clear();
                }
            }
            println!("History cleared");
        }
    }
    Ok(())
}

/// Print the overall colony health overview.
pub fn run_health(config: &Config) -> anyhow::Result<()> {
    let backend = open_backend(config)?;
    let aggregator = HealthAggregator::new(
        HistoryStore::queen(backend.clone()),
        HistoryStore::brood(backend),
    );

    let overview = aggregator.overall_health();
    println!("--- COLONY HEALTH ---");
    println!("Health score:   {} ({})", overview.health_score, overview.health_status);
    println!("Brood coverage: {}%", overview.brood_coverage);
    println!(
        "Queen cells:    {} ({} mature)",
        overview.queen_cell_info.count, overview.queen_cell_info.mature
    );
    println!("Inspections:    {}", aggregator.total_inspections());
    println!();
    println!("{}: {}", overview.alert.title, overview.alert.message);
    Ok(())
}

/// Seed the history with demo data.
pub fn run_seed(config: &Config) -> anyhow::Result<()> {
    let backend = open_backend(config)?;
    if initialize_demo_data(&backend)? {
        println!("Demo analyses written to {}", config.data_dir.display());
    } else {
        println!("Demo data already initialized, nothing to do");
    }
    Ok(())
}

fn open_backend(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    Ok(Arc::new(FileBackend::new(&config.data_dir)?))
}

fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn print_queen_analysis(analysis: &QueenCellInput) {
    println!("Queen cells detected: {}", analysis.total_queen_cells);
    for cell in &analysis.cells {
        println!(
            "  #{} {} ({}% confidence) - {}% mature, hatching in ~{} days",
            cell.id,
            cell.cell_type,
            cell.confidence,
            cell.maturity_percentage,
            cell.estimated_hatching_days
        );
    }
    println!("Recommendations:");
    for recommendation in &analysis.recommendations {
        println!("  - {recommendation}");
    }
}

fn print_brood_report(report: &BroodReport) {
    println!(
        "Hive health score: {} ({})",
        report.input.resolved_score(),
        report.input.resolved_status()
    );
    println!("Risk level: {}", report.risk_level);
    println!("Brood coverage: {}%", report.input.brood_coverage);
    println!("Breakdown:");
    for stage in &report.breakdown {
        println!(
            "  {}: {} ({}%) - {}",
            stage.stage, stage.count, stage.percentage, stage.description
        );
    }
    println!("Recommendations:");
    for recommendation in &report.input.recommendations {
        println!("  - {recommendation}");
    }
}

fn print_queen_record(record: &QueenCellRecord) {
    println!(
        "ID: {}, At: {}, Cells: {}, Mature: {}",
        record.id,
        format_timestamp(record.timestamp),
        record.total_queen_cells,
        record.maturity_distribution.mature
    );
}

fn print_brood_record(record: &BroodPatternRecord) {
    println!(
        "ID: {}, At: {}, Score: {} ({}), Coverage: {}%",
        record.id,
        format_timestamp(record.timestamp),
        record.health_score,
        record.health_status,
        record.brood_coverage
    );
}
