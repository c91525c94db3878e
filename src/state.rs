use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::qr::{BackgroundFetcher, QrService};

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub qr: QrService,
}

impl AppState {
    /// 按配置构建共享状态：背景拉取 Client 与渲染信号量（限制 CPU 密集型任务数量）
    pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let fetcher =
            BackgroundFetcher::new(config.qr.fetch_timeout(), config.qr.max_background_bytes)?;
        let permits = config.qr.effective_parallelism();
        tracing::debug!(permits, "渲染并发许可数");
        let qr = QrService::new(fetcher, Arc::new(Semaphore::new(permits)));
        Ok(Self {
            config: Arc::new(config),
            qr,
        })
    }
}
