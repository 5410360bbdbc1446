//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `BoothError` 枚举，覆盖拍照流程中的全部失败来源：
//! 摄像头权限、无可采样画面、远端生成接口失败、响应结构无法识别、品牌素材缺失。
//!
//! 所有对宿主页面暴露的操作统一返回 `Result<T, BoothError>`，
//! 宿主通过 `code()` / `stage()` 获得稳定的结构化信息，通过 `Serialize` 获得可读文案。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError`、`std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 只有 `AssetLoad` 属于可降级错误，合成阶段遇到时跳过素材继续执行。

use serde::Serialize;

use crate::image_handler::ImageError;
use crate::session::SessionMode;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum BoothError {
    /// 摄像头权限被拒绝或没有匹配朝向的设备
    #[error("无法访问摄像头: {0}")]
    MediaAccess(String),

    /// 拍照时没有任何可采样的画面
    #[error("当前没有可拍摄的画面")]
    NoSurface,

    /// 远端生成接口返回非 2xx 状态，或响应体不是合法 JSON
    #[error("生成接口错误: HTTP {status} {body}")]
    RemoteTransform { status: u16, body: String },

    /// 响应中找不到输出图片地址
    #[error("生成接口未返回输出图片地址")]
    NoOutputUrl,

    /// 品牌素材加载失败（非致命，合成时跳过）
    #[error("品牌素材 '{name}' 加载失败: {reason}")]
    AssetLoad { name: String, reason: String },

    /// 图片加载 / 解码流水线错误
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 当前模式下该操作不可用
    #[error("当前模式 {mode:?} 下无法执行操作: {action}")]
    InvalidAction { action: &'static str, mode: SessionMode },

    /// 配置文件缺失字段或取值非法
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    FileSystem(#[from] std::io::Error),

    /// 导出编码或保存失败
    #[error("导出失败: {0}")]
    Export(String),

    /// 网络请求在拿到响应前失败（连接、超时等）
    #[error("网络错误: {0}")]
    Network(String),
}

impl BoothError {
    /// 稳定错误码，供宿主页面做分支处理。
    pub fn code(&self) -> &'static str {
        match self {
            Self::MediaAccess(_) => "media_access",
            Self::NoSurface => "no_surface",
            Self::RemoteTransform { .. } => "remote_transform",
            Self::NoOutputUrl => "no_output_url",
            Self::AssetLoad { .. } => "asset_load",
            Self::Image(err) => err.code(),
            Self::InvalidAction { .. } => "invalid_action",
            Self::Config(_) => "config",
            Self::FileSystem(_) => "file_system",
            Self::Export(_) => "export",
            Self::Network(_) => "network",
        }
    }

    /// 错误发生的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::MediaAccess(_) => "source",
            Self::NoSurface => "capture",
            Self::RemoteTransform { .. } | Self::NoOutputUrl | Self::Network(_) => "transform",
            Self::AssetLoad { .. } => "composite",
            Self::Image(err) => err.stage(),
            Self::InvalidAction { .. } => "session",
            Self::Config(_) => "config",
            Self::FileSystem(_) | Self::Export(_) => "export",
        }
    }

    /// 是否只需降级处理（不中断合成）。
    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::AssetLoad { .. })
    }
}

/// 宿主 IPC 要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for BoothError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
