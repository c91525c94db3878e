use axum::{Router, extract::DefaultBodyLimit, routing::get};
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::cors::build_cors_layer;
use crate::features::{health::health_check, qr::create_qr_router};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 压缩策略：明确排除不该压缩的响应。
    //
    // - 图片：png/jpeg/gif 本身已压缩，收益极低反而浪费 CPU（SVG 与 JSON 仍压缩）
    // - application/octet-stream：二进制下载，压缩收益不确定
    //
    // 仍保留默认的最小大小阈值（默认 32B）。
    SizeAbove::default()
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 组装完整的 HTTP 应用（路由 + 中间件），main 与集成测试共用。
pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.qr.max_upload_bytes;
    let cors_layer = build_cors_layer(&state.config.cors);

    let mut app = Router::<AppState>::new()
        .route("/health", get(health_check))
        .merge(create_qr_router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    app = app.layer(axum::middleware::from_fn(request_id_middleware));

    // 应用内响应压缩：对 SVG/JSON/文本启用 gzip/brotli（data URL 响应体积较大，收益明显）。
    app = app.layer(CompressionLayer::new().compress_when(compression_predicate()));

    // CORS 放在最外层，预检请求不经过其他中间件。
    if let Some(cors) = cors_layer {
        app = app.layer(cors);
    }

    app
}
