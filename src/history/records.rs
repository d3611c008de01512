//! Persisted analysis record types and their raw inputs.
//!
//! Field names serialize in camelCase and records carry a `type` tag so
//! the on-disk JSON stays readable by the existing dashboard views.

use serde::{Deserialize, Deserializer, Serialize};

/// Discriminator stored on every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Queen,
    Brood,
}

/// Hive health classification returned by the brood model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    #[default]
    Unknown,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::Fair => "Fair",
            HealthStatus::Poor => "Poor",
            HealthStatus::Unknown => "Unknown",
        };
        write!(f, "{label}")
    }
}

/// Queen cells counted per maturity stage.
///
/// Stage counts are expected to sum to the total cell count but this is
/// not enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaturityDistribution {
    pub open: u32,
    pub capped: u32,
    #[serde(rename = "semi-mature", alias = "semiMature")]
    pub semi_mature: u32,
    pub mature: u32,
    pub failed: u32,
}

impl MaturityDistribution {
    /// Sum across all stages.
    pub fn total(&self) -> u32 {
        self.open + self.capped + self.semi_mature + self.mature + self.failed
    }
}

/// Brood cells counted per development stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroodCounts {
    pub egg: u32,
    pub larva: u32,
    pub pupa: u32,
}

impl BroodCounts {
    /// Sum across all stages.
    pub fn total(&self) -> u32 {
        self.egg + self.larva + self.pupa
    }
}

/// Per-cell detection as produced by the queen-cell pipeline.
///
/// Opaque to the history store; persisted as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CellDetection {
    pub id: u32,
    #[serde(rename = "type")]
    pub cell_type: String,
    /// Confidence as an integer percentage.
    pub confidence: u32,
    /// `[x, y, width, height]` in image pixels.
    pub bbox: [f32; 4],
    pub maturity_percentage: u32,
    pub estimated_hatching_days: u32,
    pub description: String,
}

/// Health block some versions of the brood service nest in the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthBlock {
    #[serde(deserialize_with = "lenient_score")]
    pub score: u8,
    pub status: HealthStatus,
    pub total_brood: u32,
    pub total_cells: u32,
}

// ==================== Stored records ====================

/// A persisted queen-cell analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueenCellRecord {
    /// Opaque identifier assigned at save time.
    pub id: String,
    /// Milliseconds since epoch; the authoritative ordering key.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub total_queen_cells: u32,
    pub cells: Vec<CellDetection>,
    pub maturity_distribution: MaturityDistribution,
    pub recommendations: Vec<String>,
    /// Always empty in stored form; image payloads are never persisted.
    pub image_preview: String,
}

impl Default for QueenCellRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            timestamp: 0,
            kind: RecordKind::Queen,
            total_queen_cells: 0,
            cells: Vec::new(),
            maturity_distribution: MaturityDistribution::default(),
            recommendations: Vec::new(),
            image_preview: String::new(),
        }
    }
}

/// A persisted brood-pattern analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BroodPatternRecord {
    /// Opaque identifier assigned at save time.
    pub id: String,
    /// Milliseconds since epoch; the authoritative ordering key.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub total_detections: u32,
    pub counts: BroodCounts,
    /// 0-100.
    pub health_score: u8,
    pub health_status: HealthStatus,
    /// Percentage 0-100.
    pub brood_coverage: u8,
    pub recommendations: Vec<String>,
    /// Always empty in stored form; image payloads are never persisted.
    pub image_preview: String,
}

impl Default for BroodPatternRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            timestamp: 0,
            kind: RecordKind::Brood,
            total_detections: 0,
            counts: BroodCounts::default(),
            health_score: 0,
            health_status: HealthStatus::Unknown,
            brood_coverage: 0,
            recommendations: Vec::new(),
            image_preview: String::new(),
        }
    }
}

// ==================== Raw inputs ====================

/// Raw queen-cell analysis result as produced by the inference pipeline.
///
/// Every field is optional with a zero default; the store persists what
/// it is given without further validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueenCellInput {
    pub total_queen_cells: u32,
    pub cells: Vec<CellDetection>,
    pub maturity_distribution: MaturityDistribution,
    pub recommendations: Vec<String>,
    pub image_preview: String,
}

/// Raw brood analysis result as produced by the inference pipeline.
///
/// Accepts both the flat `hiveHealthScore`/`healthStatus` shape and the
/// nested `health` block older service versions return; the image
/// fields are accepted so callers can pass results through unmodified,
/// and are dropped before persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BroodInput {
    pub total_detections: u32,
    pub counts: BroodCounts,
    #[serde(alias = "hiveHealthScore", deserialize_with = "lenient_score")]
    pub health_score: u8,
    pub health_status: HealthStatus,
    #[serde(deserialize_with = "lenient_score")]
    pub brood_coverage: u8,
    pub recommendations: Vec<String>,
    pub health: Option<HealthBlock>,
    pub image_preview: String,
    pub annotated_image: String,
    pub annotated_image_with_labels: String,
    pub original_image: String,
}

impl BroodInput {
    /// Health score with the fallback chain applied: flat field first,
    /// then the nested health block, then zero.
    pub fn resolved_score(&self) -> u8 {
        if self.health_score != 0 {
            self.health_score
        } else {
            self.health.as_ref().map(|h| h.score).unwrap_or(0)
        }
    }

    /// Health status with the same fallback chain as the score.
    pub fn resolved_status(&self) -> HealthStatus {
        if self.health_status != HealthStatus::Unknown {
            self.health_status
        } else {
            self.health
                .as_ref()
                .map(|h| h.status)
                .unwrap_or(HealthStatus::Unknown)
        }
    }
}

/// Tagged union accepted wherever either analysis kind may be saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisInput {
    Queen(QueenCellInput),
    Brood(BroodInput),
}

/// Accept integers, floats, or junk for a 0-100 score field, rounding
/// and clamping instead of rejecting the whole record.
fn lenient_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => {
            let n = n.as_f64().unwrap_or(0.0);
            n.round().clamp(0.0, 100.0) as u8
        }
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_brood_input_accepts_hive_health_score_alias() {
        let input: BroodInput = serde_json::from_value(json!({
            "hiveHealthScore": 85,
            "healthStatus": "EXCELLENT",
            "totalDetections": 189
        }))
        .unwrap();

        assert_eq!(input.health_score, 85);
        assert_eq!(input.health_status, HealthStatus::Excellent);
        assert_eq!(input.total_detections, 189);
    }

    #[test]
    fn test_brood_input_falls_back_to_nested_health_block() {
        let input: BroodInput = serde_json::from_value(json!({
            "counts": { "egg": 4, "larva": 5, "pupa": 3 },
            "health": { "score": 78, "status": "GOOD", "total_cells": 12 }
        }))
        .unwrap();

        assert_eq!(input.health_score, 0);
        assert_eq!(input.resolved_score(), 78);
        assert_eq!(input.resolved_status(), HealthStatus::Good);
    }

    #[test]
    fn test_lenient_score_rounds_and_clamps() {
        let input: BroodInput =
            serde_json::from_value(json!({ "healthScore": 78.6, "broodCoverage": 250 })).unwrap();
        assert_eq!(input.health_score, 79);
        assert_eq!(input.brood_coverage, 100);

        let input: BroodInput = serde_json::from_value(json!({ "healthScore": "n/a" })).unwrap();
        assert_eq!(input.health_score, 0);
    }

    #[test]
    fn test_maturity_distribution_accepts_both_spellings() {
        let kebab: MaturityDistribution =
            serde_json::from_value(json!({ "semi-mature": 2, "mature": 1 })).unwrap();
        let camel: MaturityDistribution =
            serde_json::from_value(json!({ "semiMature": 2, "mature": 1 })).unwrap();

        assert_eq!(kebab, camel);
        assert_eq!(kebab.semi_mature, 2);
        assert_eq!(kebab.total(), 3);
    }

    #[test]
    fn test_record_json_shape_is_stable() {
        let record = QueenCellRecord {
            id: "1733184000000".to_string(),
            timestamp: 1_733_184_000_000,
            total_queen_cells: 3,
            ..QueenCellRecord::default()
        };
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["type"], "queen");
        assert_eq!(value["totalQueenCells"], 3);
        assert_eq!(value["maturityDistribution"]["semi-mature"], 0);
        assert_eq!(value["imagePreview"], "");
    }

    #[test]
    fn test_analysis_input_dispatches_on_type_tag() {
        let input: AnalysisInput = serde_json::from_value(json!({
            "type": "brood",
            "healthScore": 90
        }))
        .unwrap();

        match input {
            AnalysisInput::Brood(brood) => assert_eq!(brood.health_score, 90),
            AnalysisInput::Queen(_) => panic!("expected brood input"),
        }
    }
}
