//! # 拍照会话控制器
//!
//! ## 设计思路
//!
//! `CaptureSession` 是唯一持有会话状态的对象：当前模式、已选人设、当前拍摄结果、
//! 帧来源、事件队列都是它的字段，生命周期由 `new` / `dispose` 显式管理。
//!
//! 所有操作都是同步的状态迁移；唯一的网络等待（生成请求）被拆成两段：
//!
//! 1. `begin_transform` → 进入 `Processing`，返回携带代次号的 `TransformTicket`
//! 2. `complete_transform` → 代次号与模式都还匹配时才应用结果
//!
//! 拍摄、上传、重拍都会递增代次号，所以重拍之后才返回的旧响应会被丢弃，
//! 不会把已经废弃的拍摄结果“复活”。生成进行中仍可拍摄、上传、重拍。
//!
//! 接口返回了结果地址即视为生成成功（进入 `Result`）；结果图加载失败只提示，
//! 预览保留原拍摄内容。
//!
//! ## 实现思路
//!
//! - 每个操作先检查当前模式下对应控件是否启用，未启用返回 `InvalidAction`。
//! - 所有失败都会写入日志并排入 `Notice` 事件，会话停留在最后一个有效模式。

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;

use super::capture::{CapturedImage, ImageOrigin, PipelineStage};
use super::events::{Notice, SessionEvent};
use super::mode::{controls_for, Control, ControlSet, SessionMode, ViewState, VisibleSurface};
use super::source::{Effect, Facing, LiveSourceProvider, SourceKind, SourceSelector};
use crate::error::BoothError;
use crate::image_handler::{redact_url_for_log, resize_rgba, DecodedImage, ImageHandler};
use crate::layout::ScreenSize;
use crate::settings::{BoothConfig, BrandingAssetConfig};
use crate::transform::TransformRequest;

/// 一次进行中的生成请求。
#[derive(Debug, Clone)]
pub struct TransformTicket {
    generation: u64,
    request: TransformRequest,
}

impl TransformTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &TransformRequest {
        &self.request
    }
}

/// 生成接口已返回结果地址；`image` 为按该地址加载结果图的结果。
#[derive(Debug)]
pub struct TransformOutput {
    pub output_url: String,
    pub image: Result<DecodedImage, BoothError>,
}

/// 导出所需的快照，在锁外完成合成与编码。
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub generation: u64,
    pub pixels: RgbaImage,
    pub app_name: String,
    pub branding: Vec<BrandingAssetConfig>,
    pub viewport: ScreenSize,
}

pub struct CaptureSession {
    config: BoothConfig,
    provider: Box<dyn LiveSourceProvider>,
    selector: SourceSelector,
    images: Arc<ImageHandler>,
    mode: SessionMode,
    persona: Option<String>,
    captured: Option<CapturedImage>,
    generation: u64,
    busy: bool,
    disposed: bool,
    events: VecDeque<SessionEvent>,
}

impl CaptureSession {
    /// 创建会话（模式为 `Bootstrapping`，尚未接触摄像头）。
    pub fn new(config: BoothConfig, provider: Box<dyn LiveSourceProvider>) -> Result<Self, BoothError> {
        config.validate()?;
        let images = Arc::new(ImageHandler::new(config.images.clone())?);
        let selector = SourceSelector::new(config.canvas, config.default_facing, config.images.resize_filter);

        Ok(Self {
            config,
            provider,
            selector,
            images,
            mode: SessionMode::Bootstrapping,
            persona: None,
            captured: None,
            generation: 0,
            busy: false,
            disposed: false,
            events: VecDeque::new(),
        })
    }

    /// 初始化供应商会话并挂载默认摄像头。
    ///
    /// 会话创建失败时停留在 `Bootstrapping`；摄像头失败只提示，不阻塞流程（仍可上传）。
    pub fn start(&mut self) -> Result<(), BoothError> {
        self.ensure_active("start")?;
        if self.mode != SessionMode::Bootstrapping {
            return Err(self.invalid("start"));
        }

        if let Err(err) = self.provider.create_session() {
            self.report(&err);
            return Err(err);
        }

        let facing = self.config.default_facing;
        if let Err(err) = self.selector.select_camera(self.provider.as_mut(), facing) {
            self.report(&err);
        }

        let next = if self.config.features.persona_gating {
            SessionMode::AwaitingProfileSelection
        } else {
            SessionMode::Live
        };
        self.transition(next);
        Ok(())
    }

    /// 选择人设并进入取景。人设会在之后每次拍摄时重新下发。
    pub fn select_persona(&mut self, persona: &str) -> Result<(), BoothError> {
        self.require(Control::SelectPersona, "select_persona")?;
        if !self.config.personas.iter().any(|p| p == persona) {
            let err = BoothError::Config(format!("未知的人设: '{}'", persona));
            self.report(&err);
            return Err(err);
        }

        self.persona = Some(persona.to_string());
        log::info!("🧑 已选择人设: {}", persona);
        self.apply_persona_effect();
        self.transition(SessionMode::Live);
        Ok(())
    }

    /// 切换摄像头朝向；失败时模式不变。
    pub fn switch_camera(&mut self, facing: Facing) -> Result<(), BoothError> {
        self.ensure_active("switch_camera")?;
        if !matches!(self.mode, SessionMode::Live | SessionMode::AwaitingProfileSelection) {
            return Err(self.invalid("switch_camera"));
        }

        if let Err(err) = self.selector.select_camera(self.provider.as_mut(), facing) {
            self.report(&err);
            return Err(err);
        }
        Ok(())
    }

    /// 当前可见画面：取景模式下为实时帧，其余为拍摄结果预览。
    pub fn render_frame(&mut self) -> Result<RgbaImage, BoothError> {
        self.ensure_active("render_frame")?;
        match self.captured.as_ref() {
            Some(captured) if self.mode.surface() == VisibleSurface::Preview => Ok(captured.pixels().clone()),
            _ => {
                let frame = self.selector.frame()?;
                self.provider.render(frame)
            }
        }
    }

    /// 采样当前取景画面，进入 `Captured`。
    pub fn capture(&mut self) -> Result<&CapturedImage, BoothError> {
        self.require(Control::Capture, "capture")?;

        self.apply_persona_effect();
        let frame = match self.selector.frame().and_then(|f| self.provider.render(f)) {
            Ok(frame) => frame,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };

        let origin = match self.selector.kind() {
            Some(SourceKind::Camera(facing)) => ImageOrigin::Camera(facing),
            _ => ImageOrigin::Upload,
        };
        self.store_capture(frame, origin)
    }

    /// 上传图片：切换到文件来源并立即采样，进入 `Captured`。
    pub fn upload(&mut self, bytes: Vec<u8>) -> Result<&CapturedImage, BoothError> {
        self.require(Control::Upload, "upload")?;

        let decoded = match self.images.decode_bytes(bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                let err = BoothError::from(err);
                self.report(&err);
                return Err(err);
            }
        };

        self.selector.select_file(&decoded.image);
        self.apply_persona_effect();
        let frame = match self.selector.frame().and_then(|f| self.provider.render(f)) {
            Ok(frame) => frame,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };

        self.store_capture(frame, ImageOrigin::Upload)
    }

    /// 丢弃拍摄结果，回到取景。
    ///
    /// 进行中的生成请求不会被取消，但它的结果会因代次号变化而被丢弃。
    /// 上传后重拍会按上次的朝向重新打开摄像头。
    pub fn retake(&mut self) -> Result<(), BoothError> {
        self.ensure_active("retake")?;
        // 人设选择之前还没有取景画面，重拍无从谈起
        if matches!(self.mode, SessionMode::Bootstrapping | SessionMode::AwaitingProfileSelection) {
            return Err(self.invalid("retake"));
        }

        self.generation += 1;
        self.captured = None;
        self.busy = false;

        if !matches!(self.selector.kind(), Some(SourceKind::Camera(_))) {
            let facing = self.selector.last_facing();
            if let Err(err) = self.selector.select_camera(self.provider.as_mut(), facing) {
                self.report(&err);
            }
        }

        self.transition(SessionMode::Live);
        Ok(())
    }

    /// 发起生成：进入 `Processing` 并显示忙碌状态。
    ///
    /// `prompt` 为空时使用配置中的提示词。
    pub fn begin_transform(&mut self, prompt: Option<&str>) -> Result<TransformTicket, BoothError> {
        self.require(Control::Generate, "generate")?;
        let captured = self.captured.as_ref().ok_or(BoothError::NoSurface)?;

        let prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(self.config.transform.prompt.as_str())
            .to_string();
        let ticket = TransformTicket {
            generation: self.generation,
            request: TransformRequest::new(captured.to_data_url(), prompt),
        };

        self.busy = true;
        self.transition(SessionMode::Processing);
        log::info!("⏳ 开始生成 - generation={}", ticket.generation);
        Ok(ticket)
    }

    /// 应用生成结果。
    ///
    /// 代次号或模式已不匹配时丢弃结果（返回 `Ok`，并排入 `StaleResultDiscarded`）。
    /// 接口失败：回到 `Captured`，拍摄结果保持不变，错误原样返回。
    /// 接口返回地址：进入 `Result`。结果图缩放到拍摄分辨率后替换内容；
    /// 结果图加载失败时只排入提示，内容保持拍摄时的样子。
    pub fn complete_transform(
        &mut self,
        ticket: &TransformTicket,
        outcome: Result<TransformOutput, BoothError>,
    ) -> Result<(), BoothError> {
        if self.disposed || ticket.generation != self.generation || self.mode != SessionMode::Processing {
            log::warn!(
                "🗑️ 丢弃过期的生成结果 - ticket={} current={} mode={}",
                ticket.generation,
                self.generation,
                self.mode.as_str()
            );
            self.events.push_back(SessionEvent::StaleResultDiscarded {
                generation: ticket.generation,
            });
            return Ok(());
        }

        self.busy = false;
        let output = match outcome {
            Ok(output) => output,
            Err(err) => {
                self.report(&err);
                self.transition(SessionMode::Captured);
                return Err(err);
            }
        };

        log::info!("✨ 生成完成 - {}", redact_url_for_log(&output.output_url));
        if let Err(err) = output.image.and_then(|decoded| self.apply_transform_result(decoded)) {
            log::warn!("⚠️ 结果图不可用，保留拍摄内容 - [{}] {}", err.code(), err);
            self.events.push_back(SessionEvent::Notice(Notice::degraded(&err)));
        }
        self.transition(SessionMode::Result);
        Ok(())
    }

    /// 生成流程被中途放弃（future 被丢弃）时的兜底恢复。
    pub(crate) fn abandon_transform(&mut self, generation: u64) {
        if generation != self.generation {
            return;
        }
        self.busy = false;
        if self.mode == SessionMode::Processing {
            log::warn!("⚠️ 生成流程被中断，恢复到 Captured - generation={}", generation);
            self.transition(SessionMode::Captured);
        }
    }

    /// 准备导出（下载 / 分享共用）。
    pub fn prepare_export(&self, control: Control) -> Result<ExportJob, BoothError> {
        let action = match control {
            Control::Share => "share",
            _ => "download",
        };
        self.require(control, action)?;
        let captured = self.captured.as_ref().ok_or(BoothError::NoSurface)?;

        Ok(ExportJob {
            generation: captured.generation(),
            pixels: captured.pixels().clone(),
            app_name: self.config.app_name.clone(),
            branding: self.config.branding.clone(),
            viewport: self.config.preview_viewport,
        })
    }

    /// 记录导出完成。拍摄结果已被替换时只记事件，不改阶段。
    pub fn mark_exported(&mut self, generation: u64, file_name: &str, location: Option<PathBuf>) {
        if let Some(captured) = self.captured.as_mut().filter(|c| c.generation() == generation) {
            captured.mark_exported();
        }
        log::info!("💾 导出完成: {}", file_name);
        self.events.push_back(SessionEvent::Exported {
            file_name: file_name.to_string(),
            location,
        });
    }

    /// 排入一条提示（失败已记录日志）。
    pub fn report(&mut self, err: &BoothError) {
        if err.is_degradable() {
            log::warn!("⚠️ [{}] {}", err.stage(), err);
        } else {
            log::error!("❌ [{}] {}", err.stage(), err);
        }
        self.events.push_back(SessionEvent::Notice(Notice::from_error(err)));
    }

    pub fn view(&self) -> ViewState {
        ViewState {
            mode: self.mode,
            controls: self.controls(),
            surface: self.mode.surface(),
            busy: self.busy,
            stage: self.captured.as_ref().map_or(PipelineStage::Live, CapturedImage::stage),
            persona: self.persona.clone(),
            facing: match self.selector.kind() {
                Some(SourceKind::Camera(facing)) => Some(facing),
                _ => None,
            },
        }
    }

    pub fn controls(&self) -> ControlSet {
        if self.disposed {
            return ControlSet::default();
        }
        controls_for(self.mode, &self.config.features, self.config.transform.is_enabled())
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    /// 结束会话：停止帧来源并丢弃拍摄结果，之后的操作都会被拒绝。
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.selector.detach();
        self.captured = None;
        self.busy = false;
        self.generation += 1;
        self.disposed = true;
        log::info!("👋 会话已结束");
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn captured(&self) -> Option<&CapturedImage> {
        self.captured.as_ref()
    }

    pub fn persona(&self) -> Option<&str> {
        self.persona.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    pub fn image_handler(&self) -> Arc<ImageHandler> {
        self.images.clone()
    }

    fn store_capture(&mut self, frame: RgbaImage, origin: ImageOrigin) -> Result<&CapturedImage, BoothError> {
        let generation = self.generation + 1;
        let captured = match CapturedImage::new(frame, origin, generation) {
            Ok(captured) => captured,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };

        self.generation = generation;
        self.busy = false;
        log::info!(
            "📸 已拍摄 - {}x{} origin={:?} generation={}",
            captured.width(),
            captured.height(),
            origin,
            generation
        );
        self.transition(SessionMode::Captured);
        Ok(self.captured.insert(captured))
    }

    fn apply_transform_result(&mut self, decoded: DecodedImage) -> Result<(), BoothError> {
        let filter = self.config.images.resize_filter;
        let captured = self.captured.as_mut().ok_or(BoothError::NoSurface)?;
        let resized = resize_rgba(&decoded.image, captured.width(), captured.height(), filter);
        captured.replace_content(resized)
    }

    /// 人设特效失败不阻塞拍摄，只提示。
    fn apply_persona_effect(&mut self) {
        let (Some(lens_id), Some(persona)) = (self.config.lens_id.as_ref(), self.persona.as_ref()) else {
            return;
        };

        let effect = Effect::with_persona(lens_id.clone(), persona.clone());
        if let Err(err) = self.provider.apply_effect(&effect) {
            self.report(&err);
        }
    }

    fn transition(&mut self, to: SessionMode) {
        if self.mode == to {
            return;
        }
        let from = self.mode;
        self.mode = to;
        log::info!("🔀 模式切换: {} → {}", from.as_str(), to.as_str());
        self.events.push_back(SessionEvent::ModeChanged { from, to });
    }

    fn require(&self, control: Control, action: &'static str) -> Result<(), BoothError> {
        self.ensure_active(action)?;
        if self.controls().contains(control) {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn ensure_active(&self, action: &'static str) -> Result<(), BoothError> {
        if self.disposed {
            Err(self.invalid(action))
        } else {
            Ok(())
        }
    }

    fn invalid(&self, action: &'static str) -> BoothError {
        BoothError::InvalidAction {
            action,
            mode: self.mode,
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
