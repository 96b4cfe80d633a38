//! Disease prediction client
//!
//! Thin HTTP client for the external model service. The service takes a
//! base64 image and returns the detected disease with a risk level.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::error::{AppError, Result};

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    image: &'a str,
}

/// Model service response
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub name: String,
    #[serde(default)]
    pub risk: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

pub struct DiseasePredictor {
    client: reqwest::Client,
    base_url: String,
}

impl DiseasePredictor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn predict(&self, image_base64: &str) -> Result<Prediction> {
        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&PredictRequest { image: image_base64 })
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Prediction service unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::upstream(format!(
                "Prediction service returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::upstream(format!("Invalid prediction response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_predict_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_json(serde_json::json!({ "image": "aGk=" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Blight",
                "risk": "high",
                "confidence": 0.93
            })))
            .mount(&server)
            .await;

        let predictor = DiseasePredictor::new(server.uri());
        let prediction = predictor.predict("aGk=").await.unwrap();
        assert_eq!(prediction.name, "Blight");
        assert_eq!(prediction.risk.as_deref(), Some("high"));
        assert_eq!(prediction.confidence, Some(0.93));
    }

    #[tokio::test]
    async fn test_service_error_maps_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let predictor = DiseasePredictor::new(server.uri());
        let err = predictor.predict("aGk=").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }
}
