//! Analysis history and derived health metrics.
//!
//! Persists queen-cell and brood-pattern analyses locally with bounded
//! growth and computes the dashboard health overview from them.

mod health;
mod records;
mod seed;
mod store;

pub use health::{
    ALERT_SCORE_THRESHOLD, HealthAggregator, HealthAlert, LatestActivity, OverallHealth,
    QueenCellInfo,
};
pub use records::{
    AnalysisInput, BroodCounts, BroodInput, BroodPatternRecord, CellDetection, HealthBlock,
    HealthStatus, MaturityDistribution, QueenCellInput, QueenCellRecord, RecordKind,
};
pub use seed::{SEED_MARKER_KEY, initialize_demo_data};
pub use store::{
    BROOD_STORAGE_KEY, HistoryRecord, HistoryStore, QUEEN_STORAGE_KEY, RETENTION_CAP,
};
