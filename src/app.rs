use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::info;
use users_api::{create_app, AppState};
use users_config::AppConfig;
use users_domain::UserService;
use users_infrastructure::{build_user_repository, BcryptPasswordHasher};
use users_observability::{
    ExclusionSet, NoopTraceProvider, ObservabilityPipeline, OtelTraceProvider, PrometheusMetrics,
    TraceContextProvider,
};

/// 主应用程序
pub struct Application {
    config: AppConfig,
    router: Router,
}

impl Application {
    /// 创建新的应用实例：指标后端、用户存储、可观测性管道和路由
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!(environment = ?config.server.environment, "初始化应用程序");

        let prometheus = Arc::new(PrometheusMetrics::new().context("创建Prometheus指标后端失败")?);

        let repository = build_user_repository(&config.database, config.server.environment)
            .await
            .context("初始化用户存储失败")?;
        let users = UserService::new(repository, Arc::new(BcryptPasswordHasher::new()));

        let exclusions = ExclusionSet::new(&config.observability.excluded_paths);
        info!(excluded_paths = ?exclusions.prefixes(), "监控排除路径");

        let trace_provider: Arc<dyn TraceContextProvider> = if config.observability.tracing_enabled {
            Arc::new(OtelTraceProvider)
        } else {
            Arc::new(NoopTraceProvider)
        };
        let pipeline = ObservabilityPipeline::new(exclusions, prometheus.clone(), trace_provider);

        let state = AppState::new(&config, users, pipeline, prometheus);

        Ok(Self {
            router: create_app(state),
            config,
        })
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let address = &self.config.server.bind_address;
        TcpListener::bind(address)
            .await
            .with_context(|| format!("绑定地址失败: {address}"))
    }

    /// 运行HTTP服务器直到收到关闭信号
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let address = listener.local_addr().context("读取监听地址失败")?;
        info!("HTTP服务器监听于 {address}");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP服务器开始优雅关闭");
            })
            .await
            .context("HTTP服务器运行失败")
    }
}
