//! # 解码与缩放流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGBA”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! 缩放统一走 `resize_rgba`：上传图片的 letterbox、生成结果回填、品牌素材贴图
//! 都依赖同一实现，保证三处观感一致。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸
//! 2. 按像素上限 / 内存上限快速拒绝
//! 3. 完整解码并转换 RGBA
//! 4. 缩放优先使用 `fast_image_resize`，失败时回退 `image::imageops::resize`

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{ImageReader, RgbaImage};
use std::io::Cursor;

use super::source::{DecodedImage, RawImageData};
use super::{ImageConfig, ImageError, ImageHandler};

impl ImageHandler {
    /// 将原始字节解码为 RGBA 位图。
    ///
    /// 先读 header 尺寸做预算检查，通过后才完整解码。
    pub(crate) fn decode_raw(
        &self,
        raw: RawImageData,
        config: &ImageConfig,
    ) -> Result<DecodedImage, ImageError> {
        let reader = ImageReader::new(Cursor::new(&raw.bytes))
            .with_guessed_format()
            .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;
        let format = reader
            .format()
            .ok_or_else(|| ImageError::InvalidFormat("不支持的图片格式".to_string()))?;

        let (header_width, header_height) = reader
            .into_dimensions()
            .map_err(|e| ImageError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))?;
        check_decode_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory_with_format(&raw.bytes, format)
            .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?
            .to_rgba8();
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ImageError::Decode("图片尺寸为 0".to_string()));
        }

        log::info!(
            "✅ 图片解码成功 - 来源: {} 格式: {:?} 尺寸: {}x{}",
            raw.source_hint,
            format,
            decoded.width(),
            decoded.height()
        );

        Ok(DecodedImage {
            image: decoded,
            source_hint: raw.source_hint,
        })
    }
}

/// 像素数与 RGBA 内存占用的预算检查。
fn check_decode_limits(config: &ImageConfig, width: u32, height: u32) -> Result<(), ImageError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > config.max_decoded_pixels {
        return Err(ImageError::ResourceLimit(format!(
            "图片像素过大：{}x{}（限制：{} 像素）",
            width, height, config.max_decoded_pixels
        )));
    }

    let bytes = pixels.saturating_mul(4);
    if bytes > config.max_decoded_bytes {
        return Err(ImageError::ResourceLimit(format!(
            "图片解码预计占用 {:.2} MB（限制：{:.2} MB）",
            bytes as f64 / 1024.0 / 1024.0,
            config.max_decoded_bytes as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

/// 将 RGBA 位图缩放到指定尺寸。
///
/// 目标尺寸与源尺寸一致时直接克隆；`fast_image_resize` 失败时回退到 `image` 自带实现。
pub fn resize_rgba(
    image: &RgbaImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> RgbaImage {
    let target_width = target_width.max(1);
    let target_height = target_height.max(1);

    if image.dimensions() == (target_width, target_height) {
        return image.clone();
    }

    match resize_with_fast_image_resize(image, target_width, target_height, filter) {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}", err);
            image::imageops::resize(image, target_width, target_height, filter)
        }
    }
}

fn resize_with_fast_image_resize(
    image: &RgbaImage,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<RgbaImage, ImageError> {
    let (src_width, src_height) = image.dimensions();

    let src_image = fr::images::Image::from_vec_u8(
        src_width,
        src_height,
        image.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ImageError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImageError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

    RgbaImage::from_raw(target_width, target_height, dst_image.into_vec())
        .ok_or_else(|| ImageError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}
