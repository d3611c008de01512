//! Shaping of brood detection responses for display and persistence.

use serde::{Deserialize, Serialize};

use crate::history::{BroodCounts, BroodInput, HealthBlock, HealthStatus};

/// Raw response from the brood detection service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BroodResponse {
    /// Total detections across all stages.
    pub count: u32,
    pub counts: BroodCounts,
    pub health: Option<HealthBlock>,
    pub recommendations: Vec<String>,
    /// Raw per-box detections, passed through untouched.
    pub detections: Vec<serde_json::Value>,
    /// Annotated previews; dropped before anything is persisted.
    pub annotated_image: String,
    pub annotated_image_with_labels: String,
}

/// Risk classification derived from the health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_status(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Excellent | HealthStatus::Good => RiskLevel::Low,
            HealthStatus::Fair => RiskLevel::Medium,
            HealthStatus::Poor | HealthStatus::Unknown => RiskLevel::High,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        write!(f, "{label}")
    }
}

/// One row of the per-stage breakdown shown with brood results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageBreakdown {
    pub stage: &'static str,
    pub count: u32,
    /// Share of all counted cells, rounded to whole percent.
    pub percentage: u32,
    pub description: &'static str,
}

/// Full report assembled from a service response.
#[derive(Debug, Clone)]
pub struct BroodReport {
    /// The persistable analysis result.
    pub input: BroodInput,
    pub risk_level: RiskLevel,
    pub breakdown: Vec<StageBreakdown>,
}

/// Build the report (and the persistable input) from a raw response.
pub fn shape_response(response: BroodResponse) -> BroodReport {
    let counts = response.counts;
    let health = response.health.unwrap_or_default();
    let total_cells = if health.total_cells > 0 {
        health.total_cells
    } else {
        counts.total()
    };

    let breakdown = vec![
        stage("Egg", counts.egg, total_cells, "Early development stage (1-3 days old)"),
        stage("Larva", counts.larva, total_cells, "Active growth stage (3-8 days old)"),
        stage("Pupa", counts.pupa, total_cells, "Pre-emergence stage (8-21 days old)"),
    ];

    let recommendations = if response.recommendations.is_empty() {
        vec!["Continue regular monitoring".to_string()]
    } else {
        response.recommendations
    };

    let input = BroodInput {
        total_detections: response.count,
        counts,
        health_score: health.score,
        health_status: health.status,
        // All detected cells are brood.
        brood_coverage: 100,
        recommendations,
        health: Some(health),
        ..BroodInput::default()
    };

    BroodReport {
        risk_level: RiskLevel::from_status(input.health_status),
        breakdown,
        input,
    }
}

fn stage(
    name: &'static str,
    count: u32,
    total: u32,
    description: &'static str,
) -> StageBreakdown {
    let percentage = if total > 0 {
        ((count as f64 / total as f64) * 100.0).round() as u32
    } else {
        0
    };
    StageBreakdown {
        stage: name,
        count,
        percentage,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_shape_response_builds_breakdown_percentages() {
        let response: BroodResponse = serde_json::from_value(json!({
            "count": 12,
            "counts": { "egg": 4, "larva": 5, "pupa": 3 },
            "health": { "score": 90, "status": "EXCELLENT", "total_cells": 12 }
        }))
        .unwrap();

        let report = shape_response(response);

        assert_eq!(report.input.health_score, 90);
        assert_eq!(report.input.health_status, HealthStatus::Excellent);
        assert_eq!(report.input.brood_coverage, 100);
        assert_eq!(report.risk_level, RiskLevel::Low);

        let percentages: Vec<u32> = report.breakdown.iter().map(|s| s.percentage).collect();
        assert_eq!(percentages, vec![33, 42, 25]);
    }

    #[test]
    fn test_total_cells_falls_back_to_counts_sum() {
        let response: BroodResponse = serde_json::from_value(json!({
            "counts": { "egg": 1, "larva": 1, "pupa": 2 }
        }))
        .unwrap();

        let report = shape_response(response);
        assert_eq!(report.breakdown[2].percentage, 50);
    }

    #[test]
    fn test_empty_response_yields_safe_defaults() {
        let report = shape_response(BroodResponse::default());

        assert_eq!(report.input.health_status, HealthStatus::Unknown);
        assert_eq!(report.risk_level, RiskLevel::High);
        assert_eq!(report.input.recommendations, vec!["Continue regular monitoring"]);
        assert!(report.breakdown.iter().all(|s| s.percentage == 0));
    }

    #[test]
    fn test_risk_level_mapping() {
        assert_eq!(RiskLevel::from_status(HealthStatus::Excellent), RiskLevel::Low);
        assert_eq!(RiskLevel::from_status(HealthStatus::Good), RiskLevel::Low);
        assert_eq!(RiskLevel::from_status(HealthStatus::Fair), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_status(HealthStatus::Poor), RiskLevel::High);
    }
}
