use axum::{
    http::{StatusCode, header},
    response::IntoResponse,
};

/// 错误响应契约：`error` 为人类可读信息，`code` 为稳定错误码。
#[tokio::test]
async fn app_error_into_response_is_error_body() {
    let resp = qraft::AppError::MissingImage.into_response();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .expect("missing Content-Type")
        .to_str()
        .expect("invalid Content-Type");
    assert_eq!(content_type, "application/json");

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");

    assert_eq!(v["error"], "Image file is missing");
    assert_eq!(v["code"], "MISSING_IMAGE");
    // 不在请求上下文中时不输出 requestId
    assert!(v.get("requestId").is_none());
}

#[tokio::test]
async fn server_side_failures_are_500() {
    let resp = qraft::AppError::BackgroundFetch("HTTP status client error (404 Not Found)".into())
        .into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(v["code"], "BACKGROUND_FETCH_FAILED");
    assert!(
        v["error"]
            .as_str()
            .unwrap_or_default()
            .starts_with("Failed to fetch background image from URL: ")
    );
}

/// 对外 JSON 字段固定为 `{url, content, description}`。
#[test]
fn generation_result_serializes_three_fields() {
    let result = qraft::generate_in_process(qraft::GenerationRequest::plain("hi", 2, "png"))
        .expect("generate");
    let v = serde_json::to_value(result).expect("serialize json");
    let obj = v.as_object().expect("object");
    assert_eq!(obj.len(), 3);
    for key in ["url", "content", "description"] {
        assert!(obj.contains_key(key), "missing {key}");
    }
}
