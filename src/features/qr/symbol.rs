use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgba};
use qrcode::render::svg;
use qrcode::types::{Color, Version};
use qrcode::{EcLevel, QrCode};

use super::types::{OutputFormat, SymbolInfo};
use crate::error::AppError;

/// 四周静区宽度（模块数）
pub const QUIET_ZONE: u32 = 4;

/// 输出图片边长上限（像素），防止超大 scale 耗尽内存
pub const MAX_CANVAS_SIDE: u32 = 8192;

/// 已编码的二维码符号。
///
/// 编码（Reed–Solomon、掩码、排布）完全交给 `qrcode`，
/// 这里只负责按 scale 栅格化、叠加背景与输出编码。
pub struct QrSymbol {
    code: QrCode,
}

impl QrSymbol {
    pub fn encode(content: &str, level: EcLevel) -> Result<Self, AppError> {
        let code = QrCode::with_error_correction_level(content.as_bytes(), level)?;
        Ok(Self { code })
    }

    pub fn info(&self) -> SymbolInfo {
        let version = match self.code.version() {
            Version::Normal(v) | Version::Micro(v) => v,
        };
        SymbolInfo {
            version,
            size: self.code.width(),
        }
    }

    /// 含静区的输出边长（像素）
    pub fn canvas_side(&self, scale: u32) -> Result<u32, AppError> {
        let modules = self.code.width() as u32 + 2 * QUIET_ZONE;
        modules
            .checked_mul(scale)
            .filter(|side| *side > 0 && *side <= MAX_CANVAS_SIDE)
            .ok_or_else(|| {
                AppError::InvalidScale(format!(
                    "{scale} (image would exceed {MAX_CANVAS_SIDE}px per side)"
                ))
            })
    }

    /// 普通二维码：黑色深色模块、白色浅色模块。
    pub fn render(
        &self,
        out: &mut Vec<u8>,
        scale: u32,
        format: OutputFormat,
    ) -> Result<(), AppError> {
        let side = self.canvas_side(scale)?;
        match format {
            OutputFormat::Svg => {
                let doc = self
                    .code
                    .render::<svg::Color>()
                    .quiet_zone(true)
                    .module_dimensions(scale, scale)
                    .dark_color(svg::Color("#000000"))
                    .light_color(svg::Color("#ffffff"))
                    .build();
                out.extend_from_slice(doc.as_bytes());
                Ok(())
            }
            OutputFormat::Text => {
                let text = self
                    .code
                    .render::<char>()
                    .quiet_zone(true)
                    .module_dimensions(1, 1)
                    .dark_color('1')
                    .light_color('0')
                    .build();
                out.extend_from_slice(text.as_bytes());
                out.push(b'\n');
                Ok(())
            }
            raster => {
                let img = GrayImage::from_fn(side, side, |x, y| {
                    if self.is_dark_pixel(x, y, scale) {
                        Luma([0])
                    } else {
                        Luma([255])
                    }
                });
                encode_raster(DynamicImage::ImageLuma8(img), raster, out)
            }
        }
    }

    /// 艺术二维码：背景图缩放铺满画布，深色模块以不透明黑色覆盖。
    pub fn render_artistic(
        &self,
        background: &[u8],
        out: &mut Vec<u8>,
        scale: u32,
        format: OutputFormat,
    ) -> Result<(), AppError> {
        if !format.is_raster() {
            return Err(AppError::UnsupportedFormat(format!(
                "{format} (artistic QR codes support png, jpg or gif)"
            )));
        }
        let side = self.canvas_side(scale)?;

        let bg = image::load_from_memory(background)?;
        let mut canvas = bg.resize_to_fill(side, side, FilterType::Lanczos3).to_rgba8();
        for (x, y, px) in canvas.enumerate_pixels_mut() {
            if self.is_dark_pixel(x, y, scale) {
                *px = Rgba([0, 0, 0, 255]);
            }
        }

        encode_raster(DynamicImage::ImageRgba8(canvas), format, out)
    }

    fn is_dark_pixel(&self, x: u32, y: u32, scale: u32) -> bool {
        let width = self.code.width();
        let (mx, my) = ((x / scale) as usize, (y / scale) as usize);
        let q = QUIET_ZONE as usize;
        if mx < q || my < q || mx - q >= width || my - q >= width {
            return false;
        }
        self.code[(mx - q, my - q)] == Color::Dark
    }
}

fn encode_raster(
    img: DynamicImage,
    format: OutputFormat,
    out: &mut Vec<u8>,
) -> Result<(), AppError> {
    let (img, image_format) = match format {
        OutputFormat::Png => (img, ImageFormat::Png),
        // JPEG 不支持透明通道
        OutputFormat::Jpg => (DynamicImage::ImageRgb8(img.to_rgb8()), ImageFormat::Jpeg),
        OutputFormat::Gif => (DynamicImage::ImageRgba8(img.to_rgba8()), ImageFormat::Gif),
        other => return Err(AppError::UnsupportedFormat(other.to_string())),
    };
    img.write_to(&mut Cursor::new(out), image_format)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_png(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb(rgb));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode background");
        buf
    }

    #[test]
    fn plain_png_has_quiet_zone_and_scale() {
        let symbol = QrSymbol::encode("https://example.com", EcLevel::H).expect("encode");
        let modules = symbol.info().size as u32;
        let mut out = Vec::new();
        symbol.render(&mut out, 3, OutputFormat::Png).expect("render");

        let img = image::load_from_memory(&out).expect("decode").to_luma8();
        assert_eq!(img.width(), (modules + 2 * QUIET_ZONE) * 3);
        // 静区为白，左上定位图案第一个模块为黑
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        let corner = QUIET_ZONE * 3;
        assert_eq!(img.get_pixel(corner, corner)[0], 0);
    }

    #[test]
    fn jpg_and_gif_outputs_decode() {
        let symbol = QrSymbol::encode("hello", EcLevel::H).expect("encode");
        for (format, expected) in [
            (OutputFormat::Jpg, ImageFormat::Jpeg),
            (OutputFormat::Gif, ImageFormat::Gif),
        ] {
            let mut out = Vec::new();
            symbol.render(&mut out, 2, format).expect("render");
            assert_eq!(image::guess_format(&out).expect("guess"), expected);
        }
    }

    #[test]
    fn svg_and_text_outputs() {
        let symbol = QrSymbol::encode("hello", EcLevel::H).expect("encode");

        let mut svg_out = Vec::new();
        symbol.render(&mut svg_out, 4, OutputFormat::Svg).expect("svg");
        let svg_doc = String::from_utf8(svg_out).expect("utf8");
        assert!(svg_doc.contains("<svg"));
        assert!(svg_doc.contains("#000000"));

        let mut text_out = Vec::new();
        symbol.render(&mut text_out, 4, OutputFormat::Text).expect("text");
        let text = String::from_utf8(text_out).expect("utf8");
        let rows: Vec<&str> = text.lines().collect();
        let side = symbol.info().size + 2 * QUIET_ZONE as usize;
        assert_eq!(rows.len(), side);
        assert!(rows.iter().all(|r| r.len() == side));
        assert!(text.chars().all(|c| matches!(c, '0' | '1' | '\n')));
    }

    #[test]
    fn artistic_keeps_background_under_light_modules() {
        let symbol = QrSymbol::encode("hello", EcLevel::H).expect("encode");
        let bg = solid_png(40, 20, [200, 30, 30]);
        let mut out = Vec::new();
        symbol
            .render_artistic(&bg, &mut out, 2, OutputFormat::Png)
            .expect("artistic");

        let img = image::load_from_memory(&out).expect("decode").to_rgba8();
        let side = (symbol.info().size as u32 + 2 * QUIET_ZONE) * 2;
        assert_eq!((img.width(), img.height()), (side, side));
        let [r, g, b, a] = img.get_pixel(0, 0).0;
        assert!(r.abs_diff(200) <= 2 && g.abs_diff(30) <= 2 && b.abs_diff(30) <= 2);
        assert_eq!(a, 255);
        let corner = QUIET_ZONE * 2;
        assert_eq!(img.get_pixel(corner, corner).0, [0, 0, 0, 255]);
    }

    #[test]
    fn artistic_rejects_vector_formats_and_bad_backgrounds() {
        let symbol = QrSymbol::encode("hello", EcLevel::H).expect("encode");
        let bg = solid_png(8, 8, [0, 0, 255]);
        let mut out = Vec::new();
        assert!(matches!(
            symbol.render_artistic(&bg, &mut out, 2, OutputFormat::Svg),
            Err(AppError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            symbol.render_artistic(b"not an image", &mut out, 2, OutputFormat::Png),
            Err(AppError::Encoding(_))
        ));
    }

    #[test]
    fn oversized_content_is_an_encoding_error() {
        let content = "x".repeat(4000);
        assert!(matches!(
            QrSymbol::encode(&content, EcLevel::H),
            Err(AppError::Encoding(_))
        ));
    }

    #[test]
    fn huge_scale_is_rejected() {
        let symbol = QrSymbol::encode("hello", EcLevel::H).expect("encode");
        let mut out = Vec::new();
        assert!(matches!(
            symbol.render(&mut out, 10_000, OutputFormat::Png),
            Err(AppError::InvalidScale(_))
        ));
    }
}
