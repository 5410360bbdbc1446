//! 拍摄结果（Captured Image）
//!
//! 位图与 PNG 编码结果一起保存：生成请求需要 data URL，导出需要位图，
//! 两者都来自同一次采样。`generation` 记录它属于哪一次拍摄，用于丢弃过期的生成结果。

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use image::RgbaImage;
use serde::Serialize;

use super::source::Facing;
use crate::error::BoothError;
use crate::export::encode_png;

/// 图片来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrigin {
    Camera(Facing),
    Upload,
}

/// 拍摄 → 生成 → 导出 流水线阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Live,
    Captured,
    Transformed,
    Exported,
}

#[derive(Debug, Clone)]
pub struct CapturedImage {
    pixels: RgbaImage,
    png: Bytes,
    origin: ImageOrigin,
    stage: PipelineStage,
    generation: u64,
}

impl CapturedImage {
    pub(crate) fn new(pixels: RgbaImage, origin: ImageOrigin, generation: u64) -> Result<Self, BoothError> {
        let png = encode_png(&pixels)?;
        Ok(Self {
            pixels,
            png,
            origin,
            stage: PipelineStage::Captured,
            generation,
        })
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn png_bytes(&self) -> Bytes {
        self.png.clone()
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `data:image/png;base64,...`
    pub fn to_data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }

    /// 用生成结果替换内容，角色（来源、代次）不变。
    pub(crate) fn replace_content(&mut self, pixels: RgbaImage) -> Result<(), BoothError> {
        self.png = encode_png(&pixels)?;
        self.pixels = pixels;
        self.stage = PipelineStage::Transformed;
        Ok(())
    }

    pub(crate) fn mark_exported(&mut self) {
        self.stage = PipelineStage::Exported;
    }
}
