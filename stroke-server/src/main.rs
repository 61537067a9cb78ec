//! 脑卒中检测服务器主程序

mod config;

use clap::Parser;
use config::Settings;
use std::net::SocketAddr;
use std::sync::Arc;
use stroke_core::Result;
use stroke_database::{DatabasePool, PgMetadataStore};
use stroke_model::{DecisionPolicy, HttpScorer};
use stroke_pipeline::IngestionPipeline;
use stroke_storage::LocalBlobStore;
use stroke_web::WebServer;
use tracing::{error, info};

/// 服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "stroke-server")]
#[command(about = "脑卒中检测医疗记录服务器")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 监听主机（覆盖配置文件）
    #[arg(long)]
    host: Option<String>,

    /// 服务器端口（覆盖配置文件）
    #[arg(short, long)]
    port: Option<u16>,

    /// 日志级别（覆盖配置文件）
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&settings.log_level))
        .init();

    info!("启动脑卒中检测服务器...");
    info!("服务器配置:");
    info!("  监听地址: {}:{}", settings.host, settings.port);
    info!("  存储目录: {}", settings.storage_dir);
    info!("  模型服务: {}", settings.model_url);
    info!("  判定阈值: {}", settings.decision_threshold);

    // 连接数据库并建表
    let pool = DatabasePool::connect(&settings.database_url, settings.max_connections).await?;
    let metadata = PgMetadataStore::new(pool);
    metadata.create_tables().await?;

    // 组装流水线：存储和模型句柄在此显式注入
    let pipeline = Arc::new(IngestionPipeline::new(
        Arc::new(metadata),
        Arc::new(LocalBlobStore::new(settings.storage_dir.clone())),
        Arc::new(HttpScorer::new(settings.model_url.clone())),
        DecisionPolicy::new(settings.decision_threshold),
        settings.base_url.clone(),
    ));

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| stroke_core::StrokeError::Config(format!("Invalid listen address: {}", e)))?;

    let server = WebServer::new(addr, pipeline);
    if let Err(e) = server.run().await {
        error!("服务器启动失败: {}", e);
        return Err(e);
    }

    Ok(())
}
