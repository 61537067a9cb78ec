//! HTTP模型服务客户端

use crate::scorer::{Prediction, Scorer};
use async_trait::async_trait;
use serde::Deserialize;
use stroke_core::{Result, StrokeError};
use tracing::debug;

/// 模型服务的响应格式
///
/// 置信度字段可选；缺省时按固定0.5策略取`max(p, 1-p)`。
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    probability: f64,
    confidence: Option<f64>,
}

impl ScoreResponse {
    /// 校验字段范围并转为预测结果
    fn into_prediction(self) -> Result<Prediction> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(StrokeError::Upstream(format!(
                "Model probability out of range: {}",
                self.probability
            )));
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(StrokeError::Upstream(format!(
                    "Model confidence out of range: {}",
                    confidence
                )));
            }
        }

        let probability = self.probability;
        let confidence = self
            .confidence
            .unwrap_or_else(|| probability.max(1.0 - probability));
        Ok(Prediction {
            probability,
            confidence,
        })
    }
}

/// 通过HTTP调用外部模型服务的打分器
pub struct HttpScorer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScorer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Scorer for HttpScorer {
    async fn classify(&self, image: &[u8]) -> Result<Prediction> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| StrokeError::Upstream(format!("Model request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StrokeError::Upstream(format!(
                "Model service returned status {}",
                response.status()
            )));
        }

        let score: ScoreResponse = response
            .json()
            .await
            .map_err(|e| StrokeError::Upstream(format!("Invalid model response: {}", e)))?;
        let prediction = score.into_prediction()?;

        debug!(
            "Scored image ({} bytes): probability={:.4} confidence={:.4}",
            image.len(),
            prediction.probability,
            prediction.confidence
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(probability: f64, confidence: Option<f64>) -> ScoreResponse {
        ScoreResponse {
            probability,
            confidence,
        }
    }

    #[test]
    fn test_out_of_range_fields_rejected() {
        assert!(matches!(
            response(1.2, None).into_prediction(),
            Err(StrokeError::Upstream(_))
        ));
        assert!(matches!(
            response(-0.1, None).into_prediction(),
            Err(StrokeError::Upstream(_))
        ));
        // 概率合法但置信度越界同样拒绝
        assert!(matches!(
            response(0.8, Some(1.5)).into_prediction(),
            Err(StrokeError::Upstream(_))
        ));
        assert!(matches!(
            response(0.8, Some(-0.2)).into_prediction(),
            Err(StrokeError::Upstream(_))
        ));
    }

    #[test]
    fn test_missing_confidence_defaults() {
        let prediction = response(0.3, None).into_prediction().unwrap();
        assert_eq!(prediction.probability, 0.3);
        assert_eq!(prediction.confidence, 0.7);

        let prediction = response(0.9, Some(0.6)).into_prediction().unwrap();
        assert_eq!(prediction.confidence, 0.6);
    }
}
