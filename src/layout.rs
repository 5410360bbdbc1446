//! 画面几何计算模块
//!
//! 该模块实现拍照流程中两类纯几何算法：
//!
//! 1. **Letterbox 适配** (`letterbox_rect`)：
//!    上传图片按比例缩放到固定画布内，长边贴满画布，另一边居中留白。
//!    不裁剪、不拉伸。
//!
//! 2. **屏幕坐标 → 图片像素坐标** (`scale_to_image`)：
//!    品牌素材在预览界面上的渲染位置/尺寸，按预览区域与图片分辨率的比例换算，
//!    使导出的合成图与用户所见一致，与输出分辨率无关。
//!
//! # 设计思路
//!
//! - 算法纯函数化：输入为尺寸与矩形，输出唯一结果，便于测试。
//! - 对异常输入（零尺寸、非有限数值）给出 `None` 或安全回退，避免上层崩溃。

use serde::{Deserialize, Serialize};

/// 画布/图片的像素尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    /// 竖屏 1080×1920 逻辑画布。
    fn default() -> Self {
        Self::new(1080, 1920)
    }
}

/// 图片像素坐标系下的矩形（左上角 + 尺寸）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// 屏幕（CSS 像素）坐标系下的矩形。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 预览区域在屏幕上的渲染尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 1920.0,
        }
    }
}

/// 计算源图在画布中的 letterbox 绘制区域。
///
/// # 实现步骤
/// 1. 处理零尺寸输入（返回整张画布，交由上层绘制空白）
/// 2. 取 `min(画布宽/源宽, 画布高/源高)` 作为统一缩放比例
/// 3. 缩放后尺寸四舍五入并收敛到画布范围内
/// 4. 两轴分别居中
///
/// # 示例
/// 2000×1000 的图片放入 1080×1920 画布：宽贴满 1080，高为 540，纵向居中 y = 690。
pub fn letterbox_rect(source_width: u32, source_height: u32, canvas: CanvasSize) -> PixelRect {
    if source_width == 0 || source_height == 0 || canvas.width == 0 || canvas.height == 0 {
        return PixelRect {
            x: 0,
            y: 0,
            width: canvas.width,
            height: canvas.height,
        };
    }

    let scale = (canvas.width as f64 / source_width as f64)
        .min(canvas.height as f64 / source_height as f64);

    let width = ((source_width as f64 * scale).round() as u32).clamp(1, canvas.width);
    let height = ((source_height as f64 * scale).round() as u32).clamp(1, canvas.height);

    PixelRect {
        x: ((canvas.width - width) / 2) as i64,
        y: ((canvas.height - height) / 2) as i64,
        width,
        height,
    }
}

/// 将屏幕坐标系下的素材矩形换算到图片像素坐标。
///
/// X/Y 轴独立按 `图片尺寸 / 预览尺寸` 缩放。
/// 预览尺寸非法或素材尺寸不为正时返回 `None`，调用方跳过该素材。
pub fn scale_to_image(rect: ScreenRect, viewport: ScreenSize, image: CanvasSize) -> Option<PixelRect> {
    let finite = [rect.x, rect.y, rect.width, rect.height, viewport.width, viewport.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite || viewport.width <= 0.0 || viewport.height <= 0.0 {
        return None;
    }
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }

    let scale_x = image.width as f64 / viewport.width;
    let scale_y = image.height as f64 / viewport.height;

    let width = (rect.width * scale_x).round().max(1.0);
    let height = (rect.height * scale_y).round().max(1.0);

    Some(PixelRect {
        x: (rect.x * scale_x).round() as i64,
        y: (rect.y * scale_y).round() as i64,
        width: width.min(u32::MAX as f64) as u32,
        height: height.min(u32::MAX as f64) as u32,
    })
}
