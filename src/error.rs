use thiserror::Error;

/// 应用统一错误类型
///
/// 三个入口（JSON 接口、附件接口、进程内/wasm 调用）共用同一组错误；
/// HTTP 入口在边界处统一转换为 `{error, code, requestId}`。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// 缺少二维码内容（`url` 字段为空）
    #[error("URL parameter is missing")]
    MissingContent,

    /// 附件接口要求上传背景图，但请求未携带
    #[error("Image file is missing")]
    MissingImage,

    /// scale 非法（非整数或小于 1）
    #[error("Invalid scale: {0}")]
    InvalidScale(String),

    /// 不支持的输出格式
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// 请求体无法解析（multipart/JSON）
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 进程内调用不支持按 URL 拉取背景图（需调用方自行获取字节）
    #[error("background_url not supported in-process - fetch it yourself and pass the bytes")]
    BackgroundUrlUnsupported,

    /// 背景图拉取失败（非 2xx、网络错误、超时或体积超限）
    #[error("Failed to fetch background image from URL: {0}")]
    BackgroundFetch(String),

    /// 编码/渲染失败（来自 qrcode 或 image）
    #[error("Failed to generate QR code: {0}")]
    Encoding(String),

    /// 内部服务器错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 稳定的错误码，用于程序化处理。
    pub fn stable_code(&self) -> &'static str {
        match self {
            AppError::MissingContent => "MISSING_CONTENT",
            AppError::MissingImage => "MISSING_IMAGE",
            AppError::InvalidScale(_) => "INVALID_SCALE",
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::BackgroundUrlUnsupported => "BACKGROUND_URL_UNSUPPORTED",
            AppError::BackgroundFetch(_) => "BACKGROUND_FETCH_FAILED",
            AppError::Encoding(_) => "ENCODING_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否属于调用方输入问题（4xx）
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingContent
                | AppError::MissingImage
                | AppError::InvalidScale(_)
                | AppError::UnsupportedFormat(_)
                | AppError::BadRequest(_)
                | AppError::BackgroundUrlUnsupported
        )
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Encoding(err.to_string())
    }
}

impl From<qrcode::types::QrError> for AppError {
    fn from(err: qrcode::types::QrError) -> Self {
        AppError::Encoding(err.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod response {
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    use serde::Serialize;

    use super::AppError;

    /// 错误响应体：`error` 与原有客户端约定保持一致，其余字段为附加信息。
    #[derive(Debug, Serialize, utoipa::ToSchema)]
    #[serde(rename_all = "camelCase")]
    pub struct ErrorBody {
        /// 人类可读的错误信息
        #[schema(example = "URL parameter is missing")]
        pub error: String,
        /// 稳定的错误码
        #[schema(example = "MISSING_CONTENT")]
        pub code: String,
        /// 请求追踪 ID
        #[serde(skip_serializing_if = "Option::is_none")]
        pub request_id: Option<String>,
    }

    impl AppError {
        pub fn status_code(&self) -> StatusCode {
            if self.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            if status.is_server_error() {
                tracing::error!(code = self.stable_code(), "请求处理失败: {}", self);
            } else {
                tracing::warn!(code = self.stable_code(), "请求参数错误: {}", self);
            }

            let body = ErrorBody {
                error: self.to_string(),
                code: self.stable_code().to_string(),
                request_id: crate::request_id::current_request_id(),
            };
            (status, Json(body)).into_response()
        }
    }

    impl From<reqwest::Error> for AppError {
        fn from(err: reqwest::Error) -> Self {
            if err.is_timeout() {
                AppError::BackgroundFetch(format!("request timed out: {err}"))
            } else {
                AppError::BackgroundFetch(err.to_string())
            }
        }
    }

    impl From<axum::extract::multipart::MultipartError> for AppError {
        fn from(err: axum::extract::multipart::MultipartError) -> Self {
            AppError::BadRequest(err.body_text())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use response::ErrorBody;

#[cfg(test)]
mod tests {
    use super::AppError;
    use std::time::Duration;

    async fn start_hanging_http_server() -> std::net::SocketAddr {
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind tcp listener");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            loop {
                let (socket, _) = match listener.accept().await {
                    Ok(v) => v,
                    Err(_) => break,
                };
                tokio::spawn(async move {
                    // 不返回任何 HTTP 响应，触发客户端 read timeout。
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    drop(socket);
                });
            }
        });

        addr
    }

    #[tokio::test]
    async fn reqwest_timeout_maps_to_background_fetch() {
        let addr = start_hanging_http_server().await;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("build reqwest client");

        let err = client
            .get(format!("http://{addr}/"))
            .send()
            .await
            .expect_err("expected timeout");
        assert!(err.is_timeout(), "expected reqwest timeout, got: {err}");

        let app: AppError = err.into();
        assert!(
            matches!(&app, AppError::BackgroundFetch(msg) if msg.contains("timed out")),
            "expected BackgroundFetch timeout, got: {app:?}"
        );
    }

    #[test]
    fn client_errors_map_to_bad_request() {
        use axum::http::StatusCode;

        assert_eq!(AppError::MissingContent.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::BackgroundFetch("404".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Encoding("data too long".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_match_client_contract() {
        assert_eq!(AppError::MissingContent.to_string(), "URL parameter is missing");
        assert_eq!(AppError::MissingImage.to_string(), "Image file is missing");
        assert!(
            AppError::BackgroundFetch("boom".into())
                .to_string()
                .starts_with("Failed to fetch background image from URL: ")
        );
    }
}
