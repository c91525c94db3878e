use qrcode::EcLevel;

use super::media;
use super::symbol::QrSymbol;
use super::types::{
    Background, BackgroundKind, BackgroundSource, GenerationRequest, GenerationResult,
    OutputFormat, RenderedQr, SymbolInfo,
};
use crate::error::AppError;

/// 固定使用最高纠错等级（约 30% 容错），艺术二维码覆盖背景后仍可识别。
pub const ERROR_LEVEL: EcLevel = EcLevel::H;

/// 进程内（wasm）调用的 scale 上限，避免浏览器内存占用过高
pub const IN_PROCESS_MAX_SCALE: u32 = 12;

/// 校验请求并解析输出格式（未知 kind 按 PNG 渲染）。
pub fn validate(request: &GenerationRequest) -> Result<OutputFormat, AppError> {
    if request.content.is_empty() {
        return Err(AppError::MissingContent);
    }
    if request.scale < 1 {
        return Err(AppError::InvalidScale(request.scale.to_string()));
    }
    Ok(OutputFormat::from_kind(&request.kind))
}

/// 同步核心：编码一次，再按有无背景选择普通/艺术渲染。
///
/// 阻塞 CPU，异步入口需放到 `spawn_blocking` 中调用。
pub fn render(
    content: &str,
    scale: u32,
    kind: &str,
    format: OutputFormat,
    background: Option<&Background>,
) -> Result<RenderedQr, AppError> {
    let symbol = QrSymbol::encode(content, ERROR_LEVEL)?;
    let mut bytes = Vec::new();

    let background_kind = match background {
        Some(bg) => {
            symbol.render_artistic(&bg.bytes, &mut bytes, scale, format)?;
            bg.kind
        }
        None => {
            symbol.render(&mut bytes, scale, format)?;
            BackgroundKind::Plain
        }
    };

    Ok(RenderedQr {
        bytes,
        media_type: media::media_type(kind),
        kind: kind.to_string(),
        background: background_kind,
        content: content.to_string(),
    })
}

impl RenderedQr {
    /// 包装为 `{url, content, description}`，url 附带 `#t=<毫秒时间戳>`。
    pub fn into_result(self, timestamp_ms: i64) -> GenerationResult {
        GenerationResult {
            url: media::data_url(self.media_type, &self.bytes, timestamp_ms),
            content: format!("QR code generated for {}", self.content),
            description: format!(
                "QR code with {} in {} format",
                self.background.describe(),
                self.kind.to_uppercase()
            ),
        }
    }

    /// 附件下载使用的文件名
    pub fn attachment_filename(&self) -> String {
        format!("artistic_qr.{}", self.kind.to_ascii_lowercase())
    }
}

/// 进程内入口（wasm 与库调用共用）：scale 上限 12，不支持按 URL 拉取背景。
pub fn generate_in_process(mut request: GenerationRequest) -> Result<GenerationResult, AppError> {
    request.scale = request.scale.min(IN_PROCESS_MAX_SCALE);
    let format = validate(&request)?;

    let background = match request.background_source() {
        BackgroundSource::Upload(bytes) => Some(Background {
            bytes,
            kind: BackgroundKind::Uploaded,
        }),
        BackgroundSource::Url(_) => return Err(AppError::BackgroundUrlUnsupported),
        BackgroundSource::None => None,
    };

    let rendered = render(
        &request.content,
        request.scale,
        &request.kind,
        format,
        background.as_ref(),
    )?;
    Ok(rendered.into_result(media::now_millis()))
}

/// 查询内容编码后的版本与模块边长
pub fn symbol_info(content: &str) -> Result<SymbolInfo, AppError> {
    if content.is_empty() {
        return Err(AppError::MissingContent);
    }
    Ok(QrSymbol::encode(content, ERROR_LEVEL)?.info())
}

#[cfg(not(target_arch = "wasm32"))]
pub use server::QrService;

#[cfg(not(target_arch = "wasm32"))]
mod server {
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::sync::Semaphore;

    use super::{render, validate};
    use crate::error::AppError;
    use crate::features::qr::background::BackgroundFetcher;
    use crate::features::qr::media;
    use crate::features::qr::types::{GenerationRequest, GenerationResult, RenderedQr};

    /// HTTP 入口共用的生成服务：解析背景 → 受信号量限制的阻塞渲染。
    #[derive(Clone)]
    pub struct QrService {
        fetcher: BackgroundFetcher,
        render_semaphore: Arc<Semaphore>,
    }

    impl QrService {
        pub fn new(fetcher: BackgroundFetcher, render_semaphore: Arc<Semaphore>) -> Self {
            Self {
                fetcher,
                render_semaphore,
            }
        }

        pub async fn render(&self, mut request: GenerationRequest) -> Result<RenderedQr, AppError> {
            let format = validate(&request)?;
            let t_total = Instant::now();

            let background = self.fetcher.resolve(request.background_source()).await?;

            let _permit = self
                .render_semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;

            // 背景解码/缩放与位图编码都是 CPU 密集操作，移出 tokio worker。
            let GenerationRequest {
                content,
                scale,
                kind,
                ..
            } = request;
            let rendered = tokio::task::spawn_blocking(move || {
                render(&content, scale, &kind, format, background.as_ref())
            })
            .await
            .map_err(|e| AppError::Internal(format!("阻塞渲染任务执行失败: {e}")))??;

            tracing::info!(
                kind = %rendered.kind,
                background = rendered.background.describe(),
                bytes = rendered.bytes.len(),
                elapsed_ms = t_total.elapsed().as_millis() as u64,
                "二维码生成完成"
            );
            Ok(rendered)
        }

        pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResult, AppError> {
            let rendered = self.render(request).await?;
            Ok(rendered.into_result(media::now_millis()))
        }
    }
}
