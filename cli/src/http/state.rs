//! HTTP服务器状态管理

use std::sync::Arc;

use surf_vcr_core::api::StreamRegistry;

/// 应用状态（在所有handlers间共享）。控制面自身不持有任何流状态。
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StreamRegistry>,
    pub secret: Arc<str>,
}

impl AppState {
    pub fn new(registry: Arc<StreamRegistry>, secret: impl Into<Arc<str>>) -> Self {
        Self {
            registry,
            secret: secret.into(),
        }
    }
}
