//! Web服务器

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use stroke_core::Result;
use stroke_pipeline::IngestionPipeline;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{
    api_root, create_consultation, create_patient, delete_consultation, delete_patient,
    get_consultation, get_image, get_patient, get_stats, health, list_consultations,
    list_patients, update_consultation, update_patient,
};

/// 请求体大小上限：单张影像10MiB，预留多张影像加表单开销
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestionPipeline>,
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, pipeline: Arc<IngestionPipeline>) -> Self {
        let app = Self::create_app(AppState { pipeline });
        Self { addr, app }
    }

    fn create_app(state: AppState) -> Router {
        Router::new()
            // 根路径
            .route("/", get(api_root))
            // 健康检查
            .route("/health", get(health))
            // API路由
            .nest("/api", api_routes())
            .with_state(state)
            // 全局中间件
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(
                        CorsLayer::new()
                            .allow_origin(Any)
                            .allow_methods(Any)
                            .allow_headers(Any),
                    )
                    .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
            )
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|e| stroke_core::StrokeError::Internal(format!("Web server failed: {}", e)))?;

        Ok(())
    }
}

/// API路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(get_stats))
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/:id",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .route(
            "/consultations",
            get(list_consultations).post(create_consultation),
        )
        .route(
            "/consultations/:id",
            get(get_consultation)
                .put(update_consultation)
                .delete(delete_consultation),
        )
        .route("/images/:id", get(get_image))
}
