//! HTTP服务器生命周期管理

use std::net::{IpAddr, SocketAddr};

use axum::{middleware, Router};
use surf_vcr_core::api::{CliError, HttpConfig, Shutdown};
use tokio::net::TcpListener;
use tracing::{error, info};

use super::{
    middleware::{create_timeout_layer, request_logger},
    routes::create_router,
    AppState,
};

/// HTTP服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for ServerConfig {
    fn from(cfg: &HttpConfig) -> Self {
        Self {
            host: cfg.host.clone(),
            port: cfg.port,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, CliError> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .map_err(|e| CliError::Server(format!("invalid host {:?}: {e}", self.host)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// 路由 + 中间件
pub fn create_app(state: AppState) -> Router {
    create_router(state)
        .layer(middleware::from_fn(request_logger))
        .layer(create_timeout_layer())
}

pub async fn bind(config: &ServerConfig) -> Result<TcpListener, CliError> {
    let addr = config.addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::Server(format!("failed to listen on {addr}: {e}")))
}

/// 在已绑定的 listener 上提供服务，直到根取消信号触发
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: Shutdown,
) -> Result<(), CliError> {
    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("Starting graceful shutdown of HTTP server...");
        })
        .await
        .map_err(|e| CliError::Server(e.to_string()))?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// 启动HTTP服务器。启动失败会触发整体关闭，让正在运行的流得以干净退出。
pub async fn run_server(
    config: ServerConfig,
    state: AppState,
    shutdown: Shutdown,
) -> Result<(), CliError> {
    let listener = match bind(&config).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, "Failed to start HTTP server");
            shutdown.trigger("http server failed to start");
            return Err(e);
        }
    };
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Starting HTTP server");
    }

    let res = serve(listener, state, shutdown.clone()).await;
    if let Err(e) = &res {
        error!(error = %e, "HTTP server failed");
        shutdown.trigger("http server failed");
    }
    res
}
