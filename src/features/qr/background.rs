use futures_util::StreamExt;
use reqwest::Client;
use std::time::{Duration, Instant};

use super::types::{Background, BackgroundKind, BackgroundSource};
use crate::error::AppError;

/// 背景图拉取器：复用同一个 reqwest Client，限制超时与响应体积。
#[derive(Clone)]
pub struct BackgroundFetcher {
    client: Client,
    max_bytes: usize,
}

impl BackgroundFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, AppError> {
        let client = crate::http::client_with_timeout(timeout)
            .map_err(|e| AppError::Internal(format!("HTTP client init failed: {e}")))?;
        Ok(Self { client, max_bytes })
    }

    /// 按 URL 下载背景图；非 2xx、网络错误、超时与超限均归为 `BackgroundFetch`。
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let started = Instant::now();
        let resp = self.client.get(url).send().await?.error_for_status()?;

        if let Some(len) = resp.content_length()
            && len as usize > self.max_bytes
        {
            return Err(self.too_large());
        }

        let mut body = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            url,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "背景图下载完成"
        );
        Ok(body)
    }

    /// 把背景来源解析为字节：上传直接使用，URL 需下载，无背景返回 None。
    pub async fn resolve(&self, source: BackgroundSource) -> Result<Option<Background>, AppError> {
        match source {
            BackgroundSource::Upload(bytes) => Ok(Some(Background {
                bytes,
                kind: BackgroundKind::Uploaded,
            })),
            BackgroundSource::Url(url) => {
                let bytes = self.fetch(&url).await?;
                Ok(Some(Background {
                    bytes,
                    kind: BackgroundKind::Remote,
                }))
            }
            BackgroundSource::None => Ok(None),
        }
    }

    fn too_large(&self) -> AppError {
        AppError::BackgroundFetch(format!(
            "response body exceeds {} bytes",
            self.max_bytes
        ))
    }
}
