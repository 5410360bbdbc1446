//! # 画面来源选择
//!
//! ## 设计思路
//!
//! 实时画面由外部 AR SDK 提供，这里只定义两个边界 trait：
//!
//! - `LiveSourceProvider`：SDK 会话本身（创建会话、打开摄像头、应用特效、渲染）
//! - `FrameProducer`：一个正在运行的帧来源（摄像头流或静态图片）
//!
//! `SourceSelector` 持有“当前唯一的帧来源”，切换时先停止旧来源再挂载新来源，
//! 保证任意时刻最多只有一个来源在运行。
//!
//! ## 实现思路
//!
//! - 前置摄像头的帧在交给上层前做水平镜像（自拍习惯），后置不镜像。
//! - 上传图片按 letterbox 规则绘制到固定画布上，由 `StillFrameProducer` 反复提供同一帧。

use std::collections::BTreeMap;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::BoothError;
use crate::image_handler::resize_rgba;
use crate::layout::{letterbox_rect, CanvasSize};

/// 摄像头朝向。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    #[default]
    Front,
    Back,
}

impl Facing {
    /// 前置摄像头按自拍习惯镜像显示。
    pub fn is_mirrored(self) -> bool {
        matches!(self, Self::Front)
    }
}

/// 供应商特效及其参数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub id: String,
    pub params: BTreeMap<String, String>,
}

impl Effect {
    /// 构造携带人设参数的特效。
    pub fn with_persona(id: impl Into<String>, persona: impl Into<String>) -> Self {
        let mut params = BTreeMap::new();
        params.insert("persona".to_string(), persona.into());
        Self { id: id.into(), params }
    }
}

/// 一个正在运行的帧来源。
pub trait FrameProducer: Send {
    /// 取当前帧（未镜像的原始方向）。
    fn next_frame(&mut self) -> Result<RgbaImage, BoothError>;

    /// 停止产出并释放设备；可重复调用。
    fn stop(&mut self);
}

/// 外部实时画面提供方（AR SDK 的边界）。
pub trait LiveSourceProvider: Send {
    fn create_session(&mut self) -> Result<(), BoothError>;

    /// 按朝向申请摄像头；权限被拒或没有匹配设备时返回 `MediaAccess`。
    fn open_camera(&mut self, facing: Facing) -> Result<Box<dyn FrameProducer>, BoothError>;

    fn apply_effect(&mut self, effect: &Effect) -> Result<(), BoothError>;

    /// 用当前特效渲染一帧。默认原样返回。
    fn render(&mut self, frame: RgbaImage) -> Result<RgbaImage, BoothError> {
        Ok(frame)
    }
}

/// 静态图片帧来源（上传的文件）。
#[derive(Debug)]
pub struct StillFrameProducer {
    frame: Option<RgbaImage>,
}

impl StillFrameProducer {
    pub fn new(frame: RgbaImage) -> Self {
        Self { frame: Some(frame) }
    }
}

impl FrameProducer for StillFrameProducer {
    fn next_frame(&mut self) -> Result<RgbaImage, BoothError> {
        self.frame.clone().ok_or(BoothError::NoSurface)
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}

/// 当前挂载的来源类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Camera(Facing),
    File,
}

/// 来源选择器：同一时刻最多一个运行中的 `FrameProducer`。
pub struct SourceSelector {
    canvas: CanvasSize,
    filter: FilterType,
    producer: Option<Box<dyn FrameProducer>>,
    kind: Option<SourceKind>,
    last_facing: Facing,
}

impl SourceSelector {
    pub fn new(canvas: CanvasSize, default_facing: Facing, filter: FilterType) -> Self {
        Self {
            canvas,
            filter,
            producer: None,
            kind: None,
            last_facing: default_facing,
        }
    }

    /// 切换到摄像头。
    ///
    /// 旧来源先停止；申请失败时不挂载任何来源，错误原样返回给调用方。
    pub fn select_camera(
        &mut self,
        provider: &mut dyn LiveSourceProvider,
        facing: Facing,
    ) -> Result<(), BoothError> {
        self.detach();
        self.last_facing = facing;

        let producer = provider.open_camera(facing).inspect_err(|e| {
            log::error!("❌ 打开摄像头失败 ({:?}): {}", facing, e);
        })?;

        self.producer = Some(producer);
        self.kind = Some(SourceKind::Camera(facing));
        log::info!("📷 已切换到摄像头: {:?}", facing);
        Ok(())
    }

    /// 切换到上传的图片，按 letterbox 绘制到画布。
    pub fn select_file(&mut self, image: &RgbaImage) {
        self.detach();

        let frame = letterbox_onto_canvas(image, self.canvas, self.filter);
        self.producer = Some(Box::new(StillFrameProducer::new(frame)));
        self.kind = Some(SourceKind::File);
        log::info!(
            "🖼️ 已切换到上传图片: {}x{} → 画布 {}x{}",
            image.width(),
            image.height(),
            self.canvas.width,
            self.canvas.height
        );
    }

    /// 取当前可显示的帧；前置摄像头帧已镜像。
    pub fn frame(&mut self) -> Result<RgbaImage, BoothError> {
        let producer = self.producer.as_mut().ok_or(BoothError::NoSurface)?;
        let frame = producer.next_frame()?;

        match self.kind {
            Some(SourceKind::Camera(facing)) if facing.is_mirrored() => Ok(imageops::flip_horizontal(&frame)),
            _ => Ok(frame),
        }
    }

    /// 停止并移除当前来源。
    pub fn detach(&mut self) {
        if let Some(mut producer) = self.producer.take() {
            producer.stop();
            log::debug!("⏹️ 已停止来源: {:?}", self.kind);
        }
        self.kind = None;
    }

    pub fn kind(&self) -> Option<SourceKind> {
        self.kind
    }

    pub fn is_attached(&self) -> bool {
        self.producer.is_some()
    }

    /// 最近一次请求的摄像头朝向（即使申请失败也会记录）。
    pub fn last_facing(&self) -> Facing {
        self.last_facing
    }
}

impl Drop for SourceSelector {
    fn drop(&mut self) {
        self.detach();
    }
}

/// 将图片按比例缩放并居中绘制到透明画布，不裁剪、不拉伸。
pub fn letterbox_onto_canvas(image: &RgbaImage, canvas: CanvasSize, filter: FilterType) -> RgbaImage {
    let rect = letterbox_rect(image.width(), image.height(), canvas);
    let mut out = RgbaImage::from_pixel(canvas.width, canvas.height, Rgba([0, 0, 0, 0]));

    let scaled = resize_rgba(image, rect.width, rect.height, filter);
    imageops::overlay(&mut out, &scaled, rect.x, rect.y);
    out
}
