//! Client for the external detection service.
//!
//! The model itself runs remotely. Requests try the hosted endpoint
//! first, then an optional local development endpoint, and finally fall
//! back to a canned sample analysis so the rest of the app keeps
//! working without connectivity.

use std::path::Path;

use base64::Engine as _;
use serde_json::json;

use crate::analysis::brood::BroodResponse;
use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::history::{
    CellDetection, MaturityDistribution, QueenCellInput,
};

/// HTTP client for queen-cell and brood detection.
pub struct InferenceClient {
    client: reqwest::Client,
    config: InferenceConfig,
}

impl InferenceClient {
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Analyze a queen-cell frame image (base64-encoded).
    ///
    /// Infallible by design: when every endpoint is down the sample
    /// analysis is returned and a warning logged.
    pub async fn analyze_queen(&self, image_b64: &str) -> QueenCellInput {
        let url = format!("{}/api/analyze", self.config.api_url);
        match self.post_gradio(&url, image_b64).await {
            Ok(result) => return result,
            Err(e) => tracing::warn!("hosted endpoint unavailable: {e}"),
        }

        if let Some(local) = &self.config.local_api_url {
            let url = format!("{local}/analyze");
            match self.post_local(&url, image_b64).await {
                Ok(result) => return result,
                Err(e) => tracing::warn!("local endpoint unavailable: {e}"),
            }
        }

        tracing::warn!("all detection endpoints failed, returning sample analysis");
        sample_queen_analysis()
    }

    /// Run brood detection on raw image bytes.
    pub async fn detect_brood(&self, image: Vec<u8>) -> Result<BroodResponse, InferenceError> {
        let url = format!("{}/brood_detect", self.config.api_url);

        let part = reqwest::multipart::Part::bytes(image)
            .file_name("brood_image.jpg")
            .mime_str("image/jpeg")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(InferenceError::Endpoint {
                url,
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }

    /// Gradio-style envelope: `{"data": [image]}` in, `{"data": [_, result]}` out.
    async fn post_gradio(
        &self,
        url: &str,
        image_b64: &str,
    ) -> Result<QueenCellInput, InferenceError> {
        let response = self
            .client
            .post(url)
            .json(&json!({ "data": [image_b64] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InferenceError::Endpoint {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        let result = body
            .get("data")
            .and_then(|data| data.get(1))
            .cloned()
            .ok_or_else(|| InferenceError::Response {
                url: url.to_string(),
                reason: "missing data[1]".to_string(),
            })?;

        serde_json::from_value(result).map_err(|e| InferenceError::Response {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Development endpoint takes `{"image": ...}` and answers with the
    /// result directly.
    async fn post_local(
        &self,
        url: &str,
        image_b64: &str,
    ) -> Result<QueenCellInput, InferenceError> {
        let response = self
            .client
            .post(url)
            .timeout(self.config.local_timeout)
            .json(&json!({ "image": image_b64 }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InferenceError::Endpoint {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}

/// Read an image file and encode it for the JSON endpoints.
pub fn encode_image(path: &Path) -> Result<String, InferenceError> {
    let bytes = std::fs::read(path).map_err(|source| InferenceError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Canned analysis used when no endpoint is reachable.
pub fn sample_queen_analysis() -> QueenCellInput {
    let cells = vec![
        CellDetection {
            id: 1,
            cell_type: "Mature".to_string(),
            confidence: 94,
            bbox: [100.0, 150.0, 80.0, 120.0],
            maturity_percentage: 95,
            estimated_hatching_days: 2,
            description: "Conical tip dark, ready to hatch".to_string(),
        },
        CellDetection {
            id: 2,
            cell_type: "Semi-mature".to_string(),
            confidence: 89,
            bbox: [300.0, 200.0, 75.0, 110.0],
            maturity_percentage: 70,
            estimated_hatching_days: 5,
            description: "Uniform color, consistent development".to_string(),
        },
        CellDetection {
            id: 3,
            cell_type: "Capped".to_string(),
            confidence: 91,
            bbox: [500.0, 180.0, 70.0, 100.0],
            maturity_percentage: 40,
            estimated_hatching_days: 7,
            description: "Partially sealed, transition stage".to_string(),
        },
    ];

    QueenCellInput {
        total_queen_cells: cells.len() as u32,
        cells,
        maturity_distribution: MaturityDistribution {
            capped: 1,
            semi_mature: 1,
            mature: 1,
            ..MaturityDistribution::default()
        },
        recommendations: vec![
            "Monitor 1 mature cell(s) for emergence within 2-3 days".to_string(),
            "Prepare secondary nucleus for cell separation".to_string(),
        ],
        image_preview: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_analysis_is_consistent() {
        let sample = sample_queen_analysis();
        assert_eq!(sample.total_queen_cells, sample.cells.len() as u32);
        assert_eq!(sample.maturity_distribution.total(), sample.total_queen_cells);
        assert!(sample.image_preview.is_empty());
    }

    #[test]
    fn test_encode_image_roundtrips() {
        use base64::Engine as _;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let encoded = encode_image(&path).unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"not really a jpeg");
    }

    #[test]
    fn test_encode_image_reports_the_path_on_failure() {
        let err = encode_image(Path::new("/no/such/frame.jpg")).unwrap_err();
        assert!(err.to_string().contains("/no/such/frame.jpg"));
    }
}
