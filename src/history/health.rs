//! Derived overall-health view over both analysis histories.

use serde::Serialize;

use super::records::{BroodPatternRecord, HealthStatus, QueenCellRecord};
use super::store::HistoryStore;

/// Score at or above which the overall alert is confirmatory rather
/// than cautionary. Dashboards key color and icon choices off this
/// branch, so the threshold is part of the contract.
pub const ALERT_SCORE_THRESHOLD: u8 = 80;

/// Queen-cell contribution to the overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueenCellInfo {
    pub count: u32,
    pub mature: u32,
}

/// Headline alert shown with the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthAlert {
    pub title: String,
    pub message: String,
}

/// Combined health summary derived from the latest record of each kind.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallHealth {
    pub health_score: u8,
    pub health_status: HealthStatus,
    pub queen_cell_info: QueenCellInfo,
    pub brood_coverage: u8,
    pub alert: HealthAlert,
    pub has_data: bool,
}

/// Latest record of each kind, for the activity feed.
#[derive(Debug, Clone, Serialize)]
pub struct LatestActivity {
    pub queen: Option<QueenCellRecord>,
    pub brood: Option<BroodPatternRecord>,
}

/// Read-time projection over the two history stores.
///
/// Holds no derived state of its own; every call recomputes from
/// current store contents.
pub struct HealthAggregator {
    queen: HistoryStore<QueenCellRecord>,
    brood: HistoryStore<BroodPatternRecord>,
}

impl HealthAggregator {
    pub fn new(
        queen: HistoryStore<QueenCellRecord>,
        brood: HistoryStore<BroodPatternRecord>,
    ) -> Self {
        Self { queen, brood }
    }

    /// Combined inspection count across both kinds.
    pub fn total_inspections(&self) -> usize {
        self.queen.count() + self.brood.count()
    }

    /// Latest record of each kind.
    pub fn latest_activity(&self) -> LatestActivity {
        LatestActivity {
            queen: self.queen.latest(),
            brood: self.brood.latest(),
        }
    }

    /// Overall health summary for the dashboard.
    ///
    /// The latest brood record is the authoritative health signal;
    /// queen-cell data contributes cell counts only. With queen data
    /// but no brood data the score is estimated from cell activity.
    pub fn overall_health(&self) -> OverallHealth {
        let latest_queen = self.queen.latest();
        let latest_brood = self.brood.latest();

        let queen_cell_info = latest_queen
            .as_ref()
            .map(|q| QueenCellInfo {
                count: q.total_queen_cells,
                mature: q.maturity_distribution.mature,
            })
            .unwrap_or_default();

        let mut health_score = 0;
        let mut health_status = HealthStatus::Unknown;
        let mut brood_coverage = 0;
        let mut message = None;

        if let Some(brood) = &latest_brood {
            health_score = brood.health_score;
            health_status = brood.health_status;
            brood_coverage = brood.brood_coverage;
            message = brood.recommendations.first().cloned();
        } else if let Some(queen) = &latest_queen {
            // No brood data; estimate from queen-cell activity.
            if queen.total_queen_cells > 0 {
                health_score = 70;
                health_status = HealthStatus::Good;
            } else {
                health_score = 50;
                health_status = HealthStatus::Fair;
            }
            message = queen.recommendations.first().cloned();
        }

        let has_data = latest_queen.is_some() || latest_brood.is_some();
        let alert = if !has_data {
            HealthAlert {
                title: "No Recent Data".to_string(),
                message: "Perform an analysis to see health overview".to_string(),
            }
        } else if health_score >= ALERT_SCORE_THRESHOLD {
            HealthAlert {
                title: "Colony Thriving".to_string(),
                message: message.unwrap_or_else(|| "Colony health looks strong".to_string()),
            }
        } else {
            HealthAlert {
                title: "Monitor Closely".to_string(),
                message: message
                    .unwrap_or_else(|| "Schedule an inspection to confirm colony health".to_string()),
            }
        };

        OverallHealth {
            health_score,
            health_status,
            queen_cell_info,
            brood_coverage,
            alert,
            has_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::records::{BroodInput, MaturityDistribution, QueenCellInput};
    use crate::storage::MemoryBackend;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn aggregator() -> HealthAggregator {
        let backend: Arc<dyn crate::storage::StorageBackend> = Arc::new(MemoryBackend::new());
        HealthAggregator::new(
            HistoryStore::queen(backend.clone()),
            HistoryStore::brood(backend),
        )
    }

    #[test]
    fn test_no_data_yields_neutral_summary() {
        let agg = aggregator();
        let overview = agg.overall_health();

        assert!(!overview.has_data);
        assert_eq!(overview.health_score, 0);
        assert_eq!(overview.health_status, HealthStatus::Unknown);
        assert_eq!(overview.queen_cell_info, QueenCellInfo::default());
        assert_eq!(overview.brood_coverage, 0);
        assert_eq!(overview.alert.title, "No Recent Data");
    }

    #[test]
    fn test_high_score_produces_confirmatory_alert() {
        let agg = aggregator();
        agg.brood.save(BroodInput {
            health_score: 85,
            ..BroodInput::default()
        });

        let overview = agg.overall_health();
        assert!(overview.has_data);
        assert_eq!(overview.health_score, 85);
        assert_eq!(overview.alert.title, "Colony Thriving");
    }

    #[test]
    fn test_low_score_produces_cautionary_alert() {
        let agg = aggregator();
        agg.brood.save(BroodInput {
            health_score: 45,
            ..BroodInput::default()
        });

        let overview = agg.overall_health();
        assert_eq!(overview.alert.title, "Monitor Closely");
    }

    #[test]
    fn test_threshold_boundary_is_confirmatory() {
        let agg = aggregator();
        agg.brood.save(BroodInput {
            health_score: ALERT_SCORE_THRESHOLD,
            ..BroodInput::default()
        });

        assert_eq!(agg.overall_health().alert.title, "Colony Thriving");
    }

    #[test]
    fn test_brood_record_is_the_authoritative_signal() {
        let agg = aggregator();
        agg.queen.save(QueenCellInput {
            total_queen_cells: 4,
            maturity_distribution: MaturityDistribution {
                mature: 3,
                capped: 1,
                ..MaturityDistribution::default()
            },
            ..QueenCellInput::default()
        });
        agg.brood.save(BroodInput {
            health_score: 82,
            health_status: HealthStatus::Excellent,
            brood_coverage: 88,
            recommendations: vec!["Excellent colony health".to_string()],
            ..BroodInput::default()
        });

        let overview = agg.overall_health();
        assert_eq!(overview.health_score, 82);
        assert_eq!(overview.health_status, HealthStatus::Excellent);
        assert_eq!(overview.brood_coverage, 88);
        assert_eq!(overview.queen_cell_info, QueenCellInfo { count: 4, mature: 3 });
        assert_eq!(overview.alert.message, "Excellent colony health");
    }

    #[test]
    fn test_queen_only_data_estimates_the_score() {
        let agg = aggregator();
        agg.queen.save(QueenCellInput {
            total_queen_cells: 2,
            ..QueenCellInput::default()
        });

        let overview = agg.overall_health();
        assert_eq!(overview.health_score, 70);
        assert_eq!(overview.health_status, HealthStatus::Good);

        agg.queen.clear();
        agg.queen.save(QueenCellInput::default());
        let overview = agg.overall_health();
        assert_eq!(overview.health_score, 50);
        assert_eq!(overview.health_status, HealthStatus::Fair);
    }

    #[test]
    fn test_total_inspections_sums_both_kinds() {
        let agg = aggregator();
        assert_eq!(agg.total_inspections(), 0);

        agg.queen.save(QueenCellInput::default());
        agg.queen.save(QueenCellInput::default());
        agg.brood.save(BroodInput::default());

        assert_eq!(agg.total_inspections(), 3);
        let activity = agg.latest_activity();
        assert!(activity.queen.is_some());
        assert!(activity.brood.is_some());
    }
}
