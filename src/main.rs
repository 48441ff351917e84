use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use users_config::AppConfig;
use users_observability::init_telemetry;
use users_service::{
    app::Application,
    shutdown::{wait_for_shutdown_signal, ShutdownManager},
};

/// 用户服务
#[derive(Debug, Parser)]
#[command(name = "users-service", version, about = "Users REST service")]
struct Cli {
    /// 配置文件路径，缺省时查找 config/users-service.toml 与 users-service.toml
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,
}

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;

    let telemetry = init_telemetry(
        &config.logging,
        &config.observability,
        config.server.environment,
    )
        .context("初始化日志和追踪失败")?;

    info!(
        tracing_enabled = telemetry.tracing_enabled(),
        "启动用户服务"
    );

    let app = Application::new(config).await?;
    let listener = app.bind().await?;

    let shutdown_manager = ShutdownManager::new();
    let shutdown_rx = shutdown_manager.subscribe().await;
    let mut server = tokio::spawn(app.run(listener, shutdown_rx));

    tokio::select! {
        result = &mut server => {
            // 服务器在收到信号前退出
            telemetry.shutdown();
            return result.context("HTTP服务器任务异常")?;
        }
        _ = wait_for_shutdown_signal() => {}
    }

    info!("收到关闭信号，开始优雅关闭...");
    shutdown_manager.shutdown().await;

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, server).await {
        Ok(Ok(Ok(()))) => info!("HTTP服务器已优雅关闭"),
        Ok(Ok(Err(e))) => error!("HTTP服务器关闭时发生错误: {e:?}"),
        Ok(Err(e)) => error!("HTTP服务器任务异常: {e}"),
        Err(_) => warn!("HTTP服务器关闭超时，强制退出"),
    }

    telemetry.shutdown();
    info!("用户服务已退出");
    Ok(())
}
