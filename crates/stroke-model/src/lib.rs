//! # Stroke Model
//!
//! 脑卒中分类模型的访问接口。模型本身作为外部协作方，
//! 本模块只定义打分接口、判定阈值策略和HTTP客户端实现。

pub mod http;
pub mod policy;
pub mod scorer;

pub use http::HttpScorer;
pub use policy::DecisionPolicy;
pub use scorer::{FixedScorer, Prediction, Scorer};
