//! 浏览器端导出（wasm-bindgen）。
//!
//! 与 HTTP 入口共用 `features::qr::service`；scale 上限 12，
//! 背景图需由调用方自行获取后以字节传入。

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use crate::error::AppError;
use crate::features::qr::types::optional_bytes;
use crate::features::qr::{GenerationRequest, generate_in_process, symbol_info};

const DEFAULT_SCALE: u32 = 8;
const DEFAULT_KIND: &str = "png";

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// `generateQr` 的参数对象
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateOptions {
    #[serde(default)]
    url: String,
    #[serde(default)]
    scale: Option<u32>,
    #[serde(default)]
    kind: Option<String>,
    /// 背景图字节（`Uint8Array`）
    #[serde(default, with = "optional_bytes")]
    image: Option<Vec<u8>>,
    #[serde(default)]
    background_url: Option<String>,
}

fn to_js(err: AppError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn into_js_result<T: serde::Serialize>(value: Result<T, AppError>) -> Result<JsValue, JsValue> {
    let value = value.map_err(to_js)?;
    serde_wasm_bindgen::to_value(&value).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// 通用入口：`{url, scale?, kind?, image?, backgroundUrl?}` → `{url, content, description}`
#[wasm_bindgen(js_name = generateQr)]
pub fn generate_qr(options: JsValue) -> Result<JsValue, JsValue> {
    let options: GenerateOptions = serde_wasm_bindgen::from_value(options)
        .map_err(|e| to_js(AppError::BadRequest(e.to_string())))?;
    let request = GenerationRequest {
        content: options.url,
        scale: options.scale.unwrap_or(DEFAULT_SCALE),
        kind: options.kind.unwrap_or_else(|| DEFAULT_KIND.to_string()),
        image: options.image,
        background_url: options.background_url,
    };
    into_js_result(generate_in_process(request))
}

/// 普通二维码
#[wasm_bindgen(js_name = generateQrPlain)]
pub fn generate_qr_plain(
    url: String,
    scale: Option<u32>,
    kind: Option<String>,
) -> Result<JsValue, JsValue> {
    let request = GenerationRequest::plain(
        url,
        scale.unwrap_or(DEFAULT_SCALE),
        kind.unwrap_or_else(|| DEFAULT_KIND.to_string()),
    );
    into_js_result(generate_in_process(request))
}

/// 艺术二维码：背景图字节由调用方提供（例如 `fetch` 后的 `Uint8Array`）
#[wasm_bindgen(js_name = generateQrWithBackgroundBytes)]
pub fn generate_qr_with_background_bytes(
    url: String,
    background: Vec<u8>,
    scale: Option<u32>,
    kind: Option<String>,
) -> Result<JsValue, JsValue> {
    let request = GenerationRequest::plain(
        url,
        scale.unwrap_or(DEFAULT_SCALE),
        kind.unwrap_or_else(|| DEFAULT_KIND.to_string()),
    )
    .with_image(background);
    into_js_result(generate_in_process(request))
}

/// 内容编码后的 `{version, size}`
#[wasm_bindgen(js_name = qrInfo)]
pub fn qr_info(content: String) -> Result<JsValue, JsValue> {
    into_js_result(symbol_info(&content))
}
