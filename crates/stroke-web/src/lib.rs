//! # Stroke Web
//!
//! HTTP路由层：请求编解组、错误到状态码的映射和中间件装配。
//! 业务语义全部在摄取流水线中，本层只做直接的请求/响应转换。

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{AppState, WebServer};
