//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `DecodedImage` 表示解码完成、可直接绘制的 RGBA 位图

use image::RgbaImage;

use super::ImageError;
use super::loader::redact_url_for_log;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 网络地址来源。
    Url(String),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
    /// 本地文件路径来源。
    FilePath(String),
    /// 已在内存中的原始字节（例如用户上传的文件）。
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// 按位置字符串推断来源类型（品牌素材配置使用）。
    ///
    /// `data:` 前缀视为 Data URL，`http(s)://` 视为网络地址，其余视为本地路径。
    pub fn from_location(location: &str) -> Self {
        let trimmed = location.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower.starts_with("data:") {
            Self::Base64(trimmed.to_string())
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::FilePath(trimmed.to_string())
        }
    }

    /// 远端返回的地址只接受 `http(s)://` 与 `data:`，不允许落到本地文件。
    pub fn from_remote_location(location: &str) -> Result<Self, ImageError> {
        match Self::from_location(location) {
            Self::FilePath(path) => Err(ImageError::InvalidFormat(format!(
                "远端结果地址必须是 http(s) 或 data URL：{}",
                redact_url_for_log(&path)
            ))),
            source => Ok(source),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Base64(_) => "base64",
            Self::FilePath(_) => "file",
            Self::Bytes(_) => "bytes",
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 解码阶段输出。
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: RgbaImage,
    pub source_hint: &'static str,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_location_detects_each_kind() {
        assert!(matches!(
            ImageSource::from_location("data:image/png;base64,AAAA"),
            ImageSource::Base64(_)
        ));
        assert!(matches!(
            ImageSource::from_location("HTTPS://cdn.example.com/a.png"),
            ImageSource::Url(_)
        ));
        assert!(matches!(
            ImageSource::from_location("assets/logo.png"),
            ImageSource::FilePath(_)
        ));
    }

    #[test]
    fn remote_location_rejects_local_paths() {
        for location in ["/etc/booth/secret.png", "u", "file:///tmp/a.png", "C:\\photos\\a.png"] {
            assert!(
                matches!(ImageSource::from_remote_location(location), Err(ImageError::InvalidFormat(_))),
                "accepted {}",
                location
            );
        }
    }

    #[test]
    fn remote_location_keeps_urls_and_data_urls() {
        assert!(matches!(
            ImageSource::from_remote_location(" https://cdn.example.com/out.png "),
            Ok(ImageSource::Url(url)) if url == "https://cdn.example.com/out.png"
        ));
        assert!(matches!(
            ImageSource::from_remote_location("data:image/png;base64,AAAA"),
            Ok(ImageSource::Base64(_))
        ));
    }
}
