//! # 品牌素材合成
//!
//! ## 设计思路
//!
//! 输出画布与拍摄结果同分辨率，品牌素材按“屏幕上的渲染矩形”换算到图片像素坐标，
//! 导出结果因此与用户看到的预览一致，与输出分辨率无关。
//!
//! 素材是装饰性的：加载失败、矩形非法都只记录警告并跳过，合成不会因此中断。
//!
//! ## 实现思路
//!
//! 1. 复制底图作为输出画布
//! 2. 逐个素材：换算矩形 → 懒加载（本地/URL/data URL）→ 缩放 → `overlay`
//! 3. 跳过的素材以 `AssetLoad` 错误返回给调用方，由会话转成提示

use image::RgbaImage;
use image::imageops;

use crate::error::BoothError;
use crate::image_handler::{resize_rgba, ImageHandler, ImageSource};
use crate::layout::{scale_to_image, CanvasSize, ScreenSize};
use crate::settings::BrandingAssetConfig;

/// 合成结果。
#[derive(Debug)]
pub struct CompositeOutcome {
    pub image: RgbaImage,
    /// 被跳过的素材（均为 `AssetLoad`）
    pub skipped: Vec<BoothError>,
}

/// 在底图上按顺序绘制品牌素材。
pub async fn composite(
    base: &RgbaImage,
    assets: &[BrandingAssetConfig],
    viewport: ScreenSize,
    images: &ImageHandler,
) -> CompositeOutcome {
    let mut output = base.clone();
    let mut skipped = Vec::new();
    let target = CanvasSize::new(base.width(), base.height());
    let filter = images.config_snapshot().resize_filter;

    for asset in assets {
        let Some(rect) = scale_to_image(asset.rect, viewport, target) else {
            skipped.push(asset_error(asset, "屏幕矩形无效"));
            continue;
        };

        let decoded = match images.load(ImageSource::from_location(&asset.location)).await {
            Ok(decoded) => decoded,
            Err(err) => {
                skipped.push(asset_error(asset, &err.to_string()));
                continue;
            }
        };

        let scaled = resize_rgba(&decoded.image, rect.width, rect.height, filter);
        imageops::overlay(&mut output, &scaled, rect.x, rect.y);
        log::debug!(
            "🏷️ 已绘制素材 '{}' at ({}, {}) {}x{}",
            asset.name,
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );
    }

    CompositeOutcome { image: output, skipped }
}

fn asset_error(asset: &BrandingAssetConfig, reason: &str) -> BoothError {
    log::warn!("⚠️ 跳过品牌素材 '{}': {}", asset.name, reason);
    BoothError::AssetLoad {
        name: asset.name.clone(),
        reason: reason.to_string(),
    }
}
