use axum::{
    Json, Router,
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;

use super::types::{GenerationRequest, GenerationResult};
use crate::config::QrConfig;
use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// 生成请求的原始表单（multipart 或 JSON 均解析到这里）
#[derive(Debug, Default)]
pub struct GenerateQrForm {
    pub url: Option<String>,
    pub scale: Option<String>,
    pub kind: Option<String>,
    pub image: Option<Vec<u8>>,
    pub background_url: Option<String>,
}

/// JSON 请求体（仅支持按 URL 指定背景）
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct GenerateQrJson {
    /// 二维码内容
    #[schema(example = "https://example.com")]
    pub url: Option<String>,
    /// 每个模块的像素数（默认 8）
    #[schema(example = 8)]
    pub scale: Option<i64>,
    /// 输出格式：png/jpg/gif/svg/text（默认 png）
    #[schema(example = "png")]
    pub kind: Option<String>,
    /// 背景图 URL（可选）
    pub background_url: Option<String>,
}

/// multipart 表单说明（仅用于 OpenAPI 文档）
#[derive(Debug, utoipa::ToSchema)]
#[allow(dead_code)]
pub struct GenerateQrMultipart {
    /// 二维码内容
    url: String,
    /// 每个模块的像素数（默认 8）
    scale: Option<u32>,
    /// 输出格式：png/jpg/gif/svg/text（默认 png）
    kind: Option<String>,
    /// 背景图文件
    #[schema(value_type = Option<String>, format = Binary)]
    image: Option<Vec<u8>>,
    /// 背景图 URL（同时提供文件时以文件为准）
    background_url: Option<String>,
}

impl From<GenerateQrJson> for GenerateQrForm {
    fn from(body: GenerateQrJson) -> Self {
        Self {
            url: body.url,
            scale: body.scale.map(|s| s.to_string()),
            kind: body.kind,
            image: None,
            background_url: body.background_url,
        }
    }
}

#[axum::async_trait]
impl<S> FromRequest<S> for GenerateQrForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.trim_start().starts_with("application/json"));

        if is_json {
            let Json(body) = Json::<GenerateQrJson>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(body.into());
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut form = GenerateQrForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "url" => form.url = Some(field.text().await?),
                "scale" => form.scale = Some(field.text().await?),
                "kind" => form.kind = Some(field.text().await?),
                "background_url" => form.background_url = Some(field.text().await?),
                "image" => {
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.image = Some(bytes.to_vec());
                    }
                }
                other => tracing::debug!(field = other, "忽略未知表单字段"),
            }
        }
        Ok(form)
    }
}

impl GenerateQrForm {
    /// 应用默认值并转换为生成请求；内容为空时先于其他参数报错。
    pub fn into_request(self, defaults: &QrConfig) -> Result<GenerationRequest, AppError> {
        let content = self.url.unwrap_or_default();
        if content.is_empty() {
            return Err(AppError::MissingContent);
        }
        let scale = match self.scale.as_deref().map(str::trim) {
            None | Some("") => defaults.default_scale,
            Some(raw) => parse_scale(raw)?,
        };
        let kind = self
            .kind
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| defaults.default_kind.clone());

        Ok(GenerationRequest {
            content,
            scale,
            kind,
            image: self.image,
            background_url: self.background_url,
        })
    }
}

fn parse_scale(raw: &str) -> Result<u32, AppError> {
    raw.parse::<u32>()
        .ok()
        .filter(|s| *s >= 1)
        .ok_or_else(|| AppError::InvalidScale(raw.to_string()))
}

#[utoipa::path(
    post,
    path = "/generate-qr",
    summary = "生成二维码（data URL）",
    description = "根据内容生成普通或艺术二维码。背景可通过上传文件（image）或 background_url 指定，二者同时提供时以上传文件为准；也接受 application/json 请求体 {url, scale, kind, background_url}。",
    request_body(content = GenerateQrMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "生成成功", body = GenerationResult),
        (status = 400, description = "参数错误", body = ErrorBody),
        (status = 500, description = "背景拉取或编码失败", body = ErrorBody)
    ),
    tag = "QR"
)]
pub async fn generate_qr(
    State(state): State<AppState>,
    form: GenerateQrForm,
) -> Result<Json<GenerationResult>, AppError> {
    let request = form.into_request(&state.config.qr)?;
    let result = state.qr.generate(request).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/generate-qr",
    summary = "生成艺术二维码（文件下载）",
    description = "必须上传背景图（image）。直接返回图片字节，并以附件形式（artistic_qr.<kind>）下载。",
    request_body(content = GenerateQrMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "图片字节（png/jpeg/gif）"),
        (status = 400, description = "缺少内容或图片", body = ErrorBody),
        (status = 500, description = "编码失败", body = ErrorBody)
    ),
    tag = "QR"
)]
pub async fn generate_qr_attachment(
    State(state): State<AppState>,
    form: GenerateQrForm,
) -> Result<impl IntoResponse, AppError> {
    let mut request = form.into_request(&state.config.qr)?;
    if request.image.is_none() {
        return Err(AppError::MissingImage);
    }
    // 该入口只接受上传的背景
    request.background_url = None;

    let rendered = state.qr.render(request).await?;
    let headers = [
        (header::CONTENT_TYPE, rendered.media_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", rendered.attachment_filename()),
        ),
    ];
    Ok((headers, rendered.bytes))
}

pub fn create_qr_router() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/generate-qr", post(generate_qr))
        .route("/api/generate-qr", post(generate_qr_attachment))
}
