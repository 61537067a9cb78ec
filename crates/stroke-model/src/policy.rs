//! 判定阈值策略
//!
//! 单张影像和会诊级别的诊断标签都由同一阈值判定，
//! 默认采用固定0.5阈值，边界值判为Stroke。

use stroke_core::Diagnosis;

/// 诊断判定策略
#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    threshold: f64,
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 根据概率判定诊断标签
    pub fn label(&self, probability: f64) -> Diagnosis {
        if probability >= self.threshold {
            Diagnosis::Stroke
        } else {
            Diagnosis::Normal
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold_boundary() {
        let policy = DecisionPolicy::default();
        // 边界值含入Stroke
        assert_eq!(policy.label(0.5), Diagnosis::Stroke);
        assert_eq!(policy.label(0.49999), Diagnosis::Normal);
        assert_eq!(policy.label(1.0), Diagnosis::Stroke);
        assert_eq!(policy.label(0.0), Diagnosis::Normal);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = DecisionPolicy::new(0.7);
        assert_eq!(policy.label(0.6), Diagnosis::Normal);
        assert_eq!(policy.label(0.7), Diagnosis::Stroke);
    }

    #[test]
    fn test_threshold_clamped() {
        assert_eq!(DecisionPolicy::new(1.5).threshold(), 1.0);
        assert_eq!(DecisionPolicy::new(-0.5).threshold(), 0.0);
    }
}
