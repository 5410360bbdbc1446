//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图片链路（下载 / 读取 / 解码 / 缩放）中的所有错误来源，
//! 避免字符串拼接式错误处理。上层通过 `From` 自动上转为 `BoothError`。

/// 图片处理统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("超时错误：{0}")]
    Timeout(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

impl ImageError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "image_network",
            Self::Decode(_) => "image_decode",
            Self::InvalidFormat(_) => "image_format",
            Self::FileSystem(_) => "image_file",
            Self::Timeout(_) => "image_timeout",
            Self::ResourceLimit(_) => "image_limit",
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::FileSystem(_) => "load",
            Self::Decode(_) | Self::InvalidFormat(_) | Self::ResourceLimit(_) => "decode",
        }
    }
}
