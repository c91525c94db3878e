use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    /// JPEG（`jpg`/`jpeg` 均可）
    #[serde(alias = "jpeg")]
    Jpg,
    Gif,
    /// SVG 文档（仅普通二维码）
    Svg,
    /// `1`/`0` 字符矩阵（仅普通二维码）
    Text,
}

impl OutputFormat {
    /// 是否为位图格式（艺术二维码只支持位图）
    pub fn is_raster(self) -> bool {
        matches!(self, OutputFormat::Png | OutputFormat::Jpg | OutputFormat::Gif)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Gif => "gif",
            OutputFormat::Svg => "svg",
            OutputFormat::Text => "text",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl OutputFormat {
    /// 按 kind 选择渲染格式（不区分大小写）；无法识别的 kind 按 PNG 渲染，
    /// 与 `media::media_type` 的 `image/png` 回退保持一致。
    pub fn from_kind(kind: &str) -> Self {
        kind.parse().unwrap_or(OutputFormat::Png)
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "gif" => Ok(OutputFormat::Gif),
            "svg" => Ok(OutputFormat::Svg),
            "text" | "txt" => Ok(OutputFormat::Text),
            _ => Err(AppError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// 一次生成请求（三个入口共用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// 编码进二维码的内容（通常是 URL）
    pub content: String,
    pub scale: u32,
    /// 原始 kind 字符串，保留调用方写法用于描述与 MIME 回退
    pub kind: String,
    /// 上传的背景图字节
    pub image: Option<Vec<u8>>,
    /// 背景图 URL
    pub background_url: Option<String>,
}

impl GenerationRequest {
    pub fn plain(content: impl Into<String>, scale: u32, kind: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            scale,
            kind: kind.into(),
            image: None,
            background_url: None,
        }
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_background_url(mut self, url: impl Into<String>) -> Self {
        self.background_url = Some(url.into());
        self
    }

    /// 取出背景来源：上传优先于 URL，空字节/空字符串视为未提供。
    pub fn background_source(&mut self) -> BackgroundSource {
        if let Some(bytes) = self.image.take().filter(|b| !b.is_empty()) {
            return BackgroundSource::Upload(bytes);
        }
        match self.background_url.take() {
            Some(url) if !url.trim().is_empty() => BackgroundSource::Url(url.trim().to_string()),
            _ => BackgroundSource::None,
        }
    }
}

/// 背景来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundSource {
    Upload(Vec<u8>),
    Url(String),
    None,
}

/// 背景的实际来源，用于结果描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundKind {
    Uploaded,
    Remote,
    Plain,
}

impl BackgroundKind {
    pub fn describe(self) -> &'static str {
        match self {
            BackgroundKind::Uploaded => "uploaded image",
            BackgroundKind::Remote => "URL image",
            BackgroundKind::Plain => "plain QR code",
        }
    }
}

/// 已解析好字节的背景
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    pub bytes: Vec<u8>,
    pub kind: BackgroundKind,
}

/// 渲染产物（附件接口直接返回，JSON 接口再包装为 data URL）
#[derive(Debug, Clone)]
pub struct RenderedQr {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub kind: String,
    pub background: BackgroundKind,
    pub content: String,
}

/// 生成结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GenerationResult {
    /// 带缓存破坏片段的 data URL
    #[schema(example = "data:image/png;base64,iVBORw0KGgo...#t=1718000000000")]
    pub url: String,
    #[schema(example = "QR code generated for https://example.com")]
    pub content: String,
    #[schema(example = "QR code with plain QR code in PNG format")]
    pub description: String,
}

/// 二维码符号信息（版本与模块边长）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SymbolInfo {
    pub version: i16,
    pub size: usize,
}

/// 可选字节字段的反序列化：优先按字节缓冲区读取（JS `Uint8Array`），
/// 也接受整数数组。
pub mod optional_bytes {
    use serde::de::{self, Deserializer, SeqAccess, Visitor};
    use std::fmt;

    pub fn deserialize<'de, D>(de: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        de.deserialize_option(OptionVisitor)
    }

    struct OptionVisitor;

    impl<'de> Visitor<'de> for OptionVisitor {
        type Value = Option<Vec<u8>>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte buffer, an integer array, or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, de: D) -> Result<Self::Value, D::Error> {
            de.deserialize_byte_buf(BytesVisitor).map(Some)
        }
    }

    struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte buffer or an integer array")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Vec<u8>, E> {
            Ok(v.to_vec())
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Vec<u8>, E> {
            Ok(v)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<u8>, A::Error> {
            let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(b) = seq.next_element::<u8>()? {
                out.push(b);
            }
            Ok(out)
        }
    }
}
