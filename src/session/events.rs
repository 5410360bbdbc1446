//! 会话事件
//!
//! 控制器不直接操作界面，只把模式变化、提示信息、导出结果排进队列，
//! 宿主通过 `CaptureSession::take_events` 取走并渲染（非阻塞通知）。

use std::path::PathBuf;

use serde::Serialize;

use super::mode::SessionMode;
use crate::error::BoothError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// 面向用户的非阻塞提示。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub code: &'static str,
    pub message: String,
}

impl Notice {
    pub fn info(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            code,
            message: message.into(),
        }
    }

    /// 流程已继续、只损失了部分效果时使用。
    pub fn degraded(err: &BoothError) -> Self {
        Self {
            level: NoticeLevel::Warning,
            ..Self::from_error(err)
        }
    }

    /// 可降级错误为警告，其余为错误。
    pub fn from_error(err: &BoothError) -> Self {
        Self {
            level: if err.is_degradable() {
                NoticeLevel::Warning
            } else {
                NoticeLevel::Error
            },
            code: err.code(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    ModeChanged { from: SessionMode, to: SessionMode },
    Notice(Notice),
    Exported { file_name: String, location: Option<PathBuf> },
    StaleResultDiscarded { generation: u64 },
}
