use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::qr::handler::generate_qr,
        crate::features::qr::handler::generate_qr_attachment,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::features::health::handler::HealthResponse,
            crate::features::qr::types::GenerationResult,
            crate::features::qr::handler::GenerateQrJson,
            crate::features::qr::handler::GenerateQrMultipart,
        )
    ),
    tags(
        (
            name = "QR",
            description = "二维码生成：普通二维码与艺术二维码（上传背景图或背景图 URL）。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Qraft API",
        version = env!("CARGO_PKG_VERSION"),
        description = "二维码生成服务 API（Axum + utoipa）。"
    )
)]
pub struct ApiDoc;
