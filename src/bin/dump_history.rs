use std::sync::Arc;

use dotenvy::dotenv;

use ibrood::config::Config;
use ibrood::history::HistoryStore;
use ibrood::storage::{FileBackend, StorageBackend};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();
    let backend: Arc<dyn StorageBackend> = Arc::new(FileBackend::new(&config.data_dir)?);
    let queen = HistoryStore::queen(backend.clone());
    let brood = HistoryStore::brood(backend);

    println!("--- TOTAL STATS ---");
    println!("Data dir: {}", config.data_dir.display());
    println!("Queen analyses: {}", queen.count());
    println!("Brood analyses: {}", brood.count());

    println!("--- QUEEN CELL ANALYSES ---");
    for record in queen.list() {
        println!(
            "ID: {}, Timestamp: {}, Cells: {}, Mature: {}, Failed: {}",
            record.id,
            record.timestamp,
            record.total_queen_cells,
            record.maturity_distribution.mature,
            record.maturity_distribution.failed
        );
        for recommendation in &record.recommendations {
            println!("  - {recommendation}");
        }
    }

    println!("--- BROOD PATTERN ANALYSES ---");
    for record in brood.list() {
        println!(
            "ID: {}, Timestamp: {}, Detections: {}, Score: {} ({}), Coverage: {}%",
            record.id,
            record.timestamp,
            record.total_detections,
            record.health_score,
            record.health_status,
            record.brood_coverage
        );
        for recommendation in &record.recommendations {
            println!("  - {recommendation}");
        }
    }

    Ok(())
}
