//! 打分接口定义

use async_trait::async_trait;
use std::collections::VecDeque;
use stroke_core::{Result, StrokeError};
use tokio::sync::Mutex;

/// 单张影像的模型输出
#[derive(Debug, Clone, Copy)]
pub struct Prediction {
    /// 脑卒中概率 [0,1]
    pub probability: f64,
    /// 模型置信度 [0,1]
    pub confidence: f64,
}

/// 脑卒中分类打分接口
///
/// 模型视为单实例资源，调用方负责串行调用；
/// 失败以`StrokeError::Upstream`返回。
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn classify(&self, image: &[u8]) -> Result<Prediction>;
}

/// 按预设脚本返回结果的打分器（测试用）
pub struct FixedScorer {
    script: Mutex<VecDeque<std::result::Result<Prediction, String>>>,
}

impl FixedScorer {
    /// 按顺序返回给定概率，置信度取`max(p, 1-p)`
    pub fn with_probabilities(probabilities: &[f64]) -> Self {
        let script = probabilities
            .iter()
            .map(|&p| {
                Ok(Prediction {
                    probability: p,
                    confidence: p.max(1.0 - p),
                })
            })
            .collect();
        Self {
            script: Mutex::new(script),
        }
    }

    /// 按给定脚本逐次返回成功或失败
    pub fn with_script(script: Vec<std::result::Result<Prediction, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl Scorer for FixedScorer {
    async fn classify(&self, _image: &[u8]) -> Result<Prediction> {
        match self.script.lock().await.pop_front() {
            Some(Ok(prediction)) => Ok(prediction),
            Some(Err(message)) => Err(StrokeError::Upstream(message)),
            None => Err(StrokeError::Upstream("Scorer script exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_scorer_order() {
        let scorer = FixedScorer::with_probabilities(&[0.2, 0.8]);

        let first = scorer.classify(b"a").await.unwrap();
        assert_eq!(first.probability, 0.2);
        assert_eq!(first.confidence, 0.8);

        let second = scorer.classify(b"b").await.unwrap();
        assert_eq!(second.probability, 0.8);

        assert!(scorer.classify(b"c").await.is_err());
    }

    #[tokio::test]
    async fn test_fixed_scorer_scripted_failure() {
        let scorer = FixedScorer::with_script(vec![Err("model offline".to_string())]);
        match scorer.classify(b"a").await {
            Err(StrokeError::Upstream(msg)) => assert_eq!(msg, "model offline"),
            other => panic!("unexpected result: {:?}", other.map(|p| p.probability)),
        }
    }
}
