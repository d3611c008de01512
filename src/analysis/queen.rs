//! Post-processing of raw queen-cell detections.

use serde::{Deserialize, Serialize};

use crate::history::{CellDetection, MaturityDistribution, QueenCellInput};

/// Overlap ratio above which two boxes are considered duplicates.
const OVERLAP_THRESHOLD: f32 = 0.1;

/// Raw detection from the model service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Stage label: open, capped, semi-mature, mature, failed.
    #[serde(rename = "class")]
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
    /// `[x, y, width, height]` in image pixels.
    pub bbox: [f32; 4],
}

struct StageInfo {
    maturity_percentage: u32,
    hatching_days: u32,
    description: &'static str,
}

fn stage_info(label: &str) -> StageInfo {
    match label {
        "open" => StageInfo {
            maturity_percentage: 10,
            hatching_days: 10,
            description: "Newly formed, larva visible",
        },
        "capped" => StageInfo {
            maturity_percentage: 40,
            hatching_days: 7,
            description: "Partially sealed, transition stage",
        },
        "semi-mature" => StageInfo {
            maturity_percentage: 70,
            hatching_days: 5,
            description: "Uniform color, consistent development",
        },
        "mature" => StageInfo {
            maturity_percentage: 95,
            hatching_days: 2,
            description: "Conical tip dark, ready to hatch",
        },
        "failed" => StageInfo {
            maturity_percentage: 0,
            hatching_days: 0,
            description: "Development stopped, requires removal",
        },
        _ => StageInfo {
            maturity_percentage: 0,
            hatching_days: 0,
            description: "Unrecognized stage",
        },
    }
}

/// Turn raw detections into a complete queen-cell analysis.
pub fn process_detections(detections: Vec<Detection>) -> QueenCellInput {
    let filtered = remove_overlapping(detections);

    let mut distribution = MaturityDistribution::default();
    let cells: Vec<CellDetection> = filtered
        .iter()
        .enumerate()
        .map(|(index, detection)| {
            tally(&mut distribution, &detection.label);
            let info = stage_info(&detection.label);
            CellDetection {
                id: index as u32 + 1,
                cell_type: display_label(&detection.label),
                confidence: (detection.confidence * 100.0).round() as u32,
                bbox: detection.bbox,
                maturity_percentage: info.maturity_percentage,
                estimated_hatching_days: info.hatching_days,
                description: info.description.to_string(),
            }
        })
        .collect();

    let recommendations = generate_recommendations(&distribution, cells.len());

    QueenCellInput {
        total_queen_cells: cells.len() as u32,
        cells,
        maturity_distribution: distribution,
        recommendations,
        image_preview: String::new(),
    }
}

/// Drop lower-confidence boxes that overlap an already-kept box.
pub fn remove_overlapping(detections: Vec<Detection>) -> Vec<Detection> {
    let mut filtered: Vec<Detection> = Vec::new();

    for detection in detections {
        let mut keep = true;
        for existing in filtered.iter_mut() {
            if overlap(&detection.bbox, &existing.bbox) > OVERLAP_THRESHOLD {
                if detection.confidence > existing.confidence {
                    *existing = detection.clone();
                }
                keep = false;
                break;
            }
        }
        if keep {
            filtered.push(detection);
        }
    }

    filtered
}

/// Intersection-over-union of two `[x, y, w, h]` boxes.
fn overlap(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let [x1, y1, w1, h1] = *a;
    let [x2, y2, w2, h2] = *b;

    let left = x1.max(x2);
    let top = y1.max(y2);
    let right = (x1 + w1).min(x2 + w2);
    let bottom = (y1 + h1).min(y2 + h2);

    if left >= right || top >= bottom {
        return 0.0;
    }

    let intersection = (right - left) * (bottom - top);
    let union = w1 * h1 + w2 * h2 - intersection;
    intersection / union
}

/// Derive keeper guidance from the maturity distribution.
pub fn generate_recommendations(
    distribution: &MaturityDistribution,
    total_cells: usize,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if distribution.mature > 0 {
        recommendations.push(format!(
            "Monitor {} mature cell(s) for emergence within 2-3 days",
            distribution.mature
        ));
    }
    if distribution.failed > 0 {
        recommendations.push(format!(
            "Remove {} failed cell(s) to prevent disease",
            distribution.failed
        ));
    }
    if total_cells > 5 {
        recommendations
            .push("High queen cell count - consider swarm prevention measures".to_string());
    }
    if distribution.semi_mature > 0 {
        recommendations.push("Prepare secondary nucleus for cell separation".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("Continue regular monitoring".to_string());
    }
    recommendations
}

fn tally(distribution: &mut MaturityDistribution, label: &str) {
    match label {
        "open" => distribution.open += 1,
        "capped" => distribution.capped += 1,
        "semi-mature" => distribution.semi_mature += 1,
        "mature" => distribution.mature += 1,
        "failed" => distribution.failed += 1,
        _ => {}
    }
}

/// "semi-mature" -> "Semi-mature".
fn display_label(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detection(label: &str, confidence: f32, bbox: [f32; 4]) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox,
        }
    }

    #[test]
    fn test_overlap_of_disjoint_boxes_is_zero() {
        assert_eq!(overlap(&[0.0, 0.0, 10.0, 10.0], &[20.0, 20.0, 10.0, 10.0]), 0.0);
    }

    #[test]
    fn test_overlap_of_identical_boxes_is_one() {
        let b = [5.0, 5.0, 10.0, 20.0];
        assert!((overlap(&b, &b) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overlapping_boxes_keep_highest_confidence() {
        let kept = remove_overlapping(vec![
            detection("mature", 0.80, [0.0, 0.0, 100.0, 100.0]),
            detection("capped", 0.95, [10.0, 10.0, 100.0, 100.0]),
            detection("open", 0.60, [500.0, 500.0, 50.0, 50.0]),
        ]);

        assert_eq!(kept.len(), 2);
        // The higher-confidence box replaced the first one in place.
        assert_eq!(kept[0].label, "capped");
        assert_eq!(kept[1].label, "open");
    }

    #[test]
    fn test_process_detections_builds_distribution_and_cells() {
        let input = process_detections(vec![
            detection("mature", 0.94, [100.0, 150.0, 80.0, 120.0]),
            detection("semi-mature", 0.89, [300.0, 200.0, 75.0, 110.0]),
            detection("capped", 0.91, [500.0, 180.0, 70.0, 100.0]),
        ]);

        assert_eq!(input.total_queen_cells, 3);
        assert_eq!(input.maturity_distribution.mature, 1);
        assert_eq!(input.maturity_distribution.semi_mature, 1);
        assert_eq!(input.maturity_distribution.capped, 1);

        let mature = &input.cells[0];
        assert_eq!(mature.id, 1);
        assert_eq!(mature.cell_type, "Mature");
        assert_eq!(mature.confidence, 94);
        assert_eq!(mature.maturity_percentage, 95);
        assert_eq!(mature.estimated_hatching_days, 2);

        assert!(
            input
                .recommendations
                .iter()
                .any(|r| r.contains("1 mature cell(s)"))
        );
    }

    #[test]
    fn test_recommendations_cover_each_branch() {
        let distribution = MaturityDistribution {
            mature: 2,
            failed: 1,
            semi_mature: 1,
            ..MaturityDistribution::default()
        };
        let recommendations = generate_recommendations(&distribution, 7);

        assert_eq!(recommendations.len(), 4);
        assert!(recommendations[0].contains("2 mature cell(s)"));
        assert!(recommendations[1].contains("1 failed cell(s)"));
        assert!(recommendations[2].contains("swarm prevention"));
        assert!(recommendations[3].contains("secondary nucleus"));
    }

    #[test]
    fn test_no_findings_falls_back_to_monitoring() {
        let input = process_detections(Vec::new());
        assert_eq!(input.total_queen_cells, 0);
        assert_eq!(input.recommendations, vec!["Continue regular monitoring"]);
    }
}
