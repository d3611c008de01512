//! One-shot demo data for first runs without a configured model service.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::records::{
    BroodCounts, BroodPatternRecord, HealthStatus, MaturityDistribution, QueenCellRecord,
    RecordKind,
};
use super::store::{BROOD_STORAGE_KEY, QUEEN_STORAGE_KEY};
use crate::error::StorageError;
use crate::storage::StorageBackend;

/// Marker key set once the demo data has been written.
pub const SEED_MARKER_KEY: &str = "ibrood_mock_data_initialized";

/// Populate both histories with sample analyses, once.
///
/// Returns `false` without touching anything when the marker key is
/// already set, so repeated invocations never overwrite real data.
pub fn initialize_demo_data(backend: &Arc<dyn StorageBackend>) -> Result<bool, StorageError> {
    if backend.get(SEED_MARKER_KEY)?.is_some() {
        return Ok(false);
    }

    let queen = serde_json::to_string(&demo_queen_records()).map_err(|e| {
        StorageError::WriteFailed {
            key: QUEEN_STORAGE_KEY.to_string(),
            reason: e.to_string(),
        }
    })?;
    let brood = serde_json::to_string(&demo_brood_records()).map_err(|e| {
        StorageError::WriteFailed {
            key: BROOD_STORAGE_KEY.to_string(),
            reason: e.to_string(),
        }
    })?;

    backend.set(QUEEN_STORAGE_KEY, &queen)?;
    backend.set(BROOD_STORAGE_KEY, &brood)?;
    backend.set(SEED_MARKER_KEY, "true")?;

    tracing::info!("demo analyses written");
    Ok(true)
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> i64 {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

fn queen(
    timestamp: i64,
    total: u32,
    distribution: MaturityDistribution,
    recommendations: &[&str],
) -> QueenCellRecord {
    QueenCellRecord {
        id: timestamp.to_string(),
        timestamp,
        kind: RecordKind::Queen,
        total_queen_cells: total,
        cells: Vec::new(),
        maturity_distribution: distribution,
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
        image_preview: String::new(),
    }
}

fn brood(
    timestamp: i64,
    total: u32,
    counts: BroodCounts,
    score: u8,
    status: HealthStatus,
    coverage: u8,
    recommendations: &[&str],
) -> BroodPatternRecord {
    BroodPatternRecord {
        id: timestamp.to_string(),
        timestamp,
        kind: RecordKind::Brood,
        total_detections: total,
        counts,
        health_score: score,
        health_status: status,
        brood_coverage: coverage,
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
        image_preview: String::new(),
    }
}

/// Sample queen-cell analyses over two inspection days, newest first.
fn demo_queen_records() -> Vec<QueenCellRecord> {
    vec![
        queen(
            at(2025, 12, 3, 10, 0),
            2,
            MaturityDistribution {
                semi_mature: 1,
                mature: 1,
                ..MaturityDistribution::default()
            },
            &["Healthy queen cell activity", "Continue monitoring"],
        ),
        queen(
            at(2025, 12, 3, 8, 0),
            4,
            MaturityDistribution {
                capped: 1,
                mature: 3,
                ..MaturityDistribution::default()
            },
            &["Multiple mature cells detected", "Consider splitting hive"],
        ),
        queen(
            at(2025, 12, 2, 14, 0),
            2,
            MaturityDistribution {
                capped: 1,
                mature: 1,
                ..MaturityDistribution::default()
            },
            &["Good queen cell development", "Continue regular monitoring"],
        ),
        queen(
            at(2025, 12, 2, 9, 0),
            3,
            MaturityDistribution {
                capped: 1,
                semi_mature: 1,
                mature: 1,
                ..MaturityDistribution::default()
            },
            &["Monitor mature cell closely", "Prepare for potential emergence"],
        ),
    ]
}

/// Sample brood analyses over the same two days, newest first.
fn demo_brood_records() -> Vec<BroodPatternRecord> {
    vec![
        brood(
            at(2025, 12, 3, 9, 30),
            167,
            BroodCounts {
                egg: 48,
                larva: 72,
                pupa: 47,
            },
            82,
            HealthStatus::Excellent,
            85,
            &["Strong colony performance", "Excellent egg laying rate"],
        ),
        brood(
            at(2025, 12, 3, 7, 0),
            134,
            BroodCounts {
                egg: 38,
                larva: 56,
                pupa: 40,
            },
            75,
            HealthStatus::Good,
            79,
            &["Healthy brood development", "Continue regular feeding"],
        ),
        brood(
            at(2025, 12, 2, 12, 0),
            189,
            BroodCounts {
                egg: 52,
                larva: 78,
                pupa: 59,
            },
            85,
            HealthStatus::Excellent,
            88,
            &["Excellent colony health", "Brood pattern is optimal"],
        ),
        brood(
            at(2025, 12, 2, 8, 0),
            156,
            BroodCounts {
                egg: 45,
                larva: 67,
                pupa: 44,
            },
            78,
            HealthStatus::Good,
            82,
            &["Good brood pattern", "Queen is actively laying"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::store::HistoryStore;
    use crate::storage::MemoryBackend;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_seed_populates_both_histories() {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        assert!(initialize_demo_data(&backend).unwrap());

        let queen = HistoryStore::queen(backend.clone());
        let brood = HistoryStore::brood(backend.clone());
        assert_eq!(queen.count(), 4);
        assert_eq!(brood.count(), 4);

        // Newest first, like every other write path.
        let timestamps: Vec<i64> = queen.list().iter().map(|r| r.timestamp).collect();
        assert!(timestamps.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn test_seed_runs_only_once() {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        assert!(initialize_demo_data(&backend).unwrap());

        let brood = HistoryStore::brood(backend.clone());
        brood.clear();

        // The marker prevents a second seed from resurrecting demo data.
        assert!(!initialize_demo_data(&backend).unwrap());
        assert_eq!(brood.count(), 0);
    }
}
