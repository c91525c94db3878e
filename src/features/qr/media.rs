use base64::Engine;
use base64::prelude::BASE64_STANDARD;

/// 根据 kind 选择 MIME 类型；未知值回退到 `image/png`。
pub fn media_type(kind: &str) -> &'static str {
    match kind.trim().to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "text" | "txt" => "text/plain",
        _ => "image/png",
    }
}

/// 拼接 data URL，并附加毫秒时间戳片段用于缓存破坏。
pub fn data_url(media_type: &str, bytes: &[u8], timestamp_ms: i64) -> String {
    format!(
        "data:{media_type};base64,{}#t={timestamp_ms}",
        BASE64_STANDARD.encode(bytes)
    )
}

/// 当前 Unix 毫秒时间戳
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 去掉 `#t=` 片段，得到可比较的 data URL 主体。
pub fn strip_cache_buster(url: &str) -> &str {
    url.rsplit_once("#t=").map_or(url, |(body, _)| body)
}
