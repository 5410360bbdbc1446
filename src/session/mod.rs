//! # 拍照会话模块
//!
//! ## 模块结构
//!
//! | 子模块 | 职责 |
//! |--------|------|
//! | `mode` | 模式枚举、控件表、可见画面 |
//! | `source` | 帧来源选择与外部 SDK 边界 trait |
//! | `capture` | 拍摄结果与流水线阶段 |
//! | `events` | 提示与模式变化事件 |
//! | `controller` | `CaptureSession` 同步状态机 |
//! | `shared` | `SharedSession` 异步流程（生成 / 导出）与忙碌守卫 |

mod capture;
mod controller;
mod events;
mod mode;
mod shared;
mod source;

pub use capture::{CapturedImage, ImageOrigin, PipelineStage};
pub use controller::{CaptureSession, ExportJob, TransformOutput, TransformTicket};
pub use events::{Notice, NoticeLevel, SessionEvent};
pub use mode::{controls_for, Control, ControlSet, SessionMode, ViewState, VisibleSurface};
pub use shared::SharedSession;
pub use source::{
    letterbox_onto_canvas, Effect, Facing, FrameProducer, LiveSourceProvider, SourceKind, SourceSelector,
    StillFrameProducer,
};
