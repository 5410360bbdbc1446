//! # 原始字节加载
//!
//! 把各种来源统一成 `RawImageData`：
//!
//! | 来源 | 校验 |
//! |------|------|
//! | URL | 交给 `remote::RemoteFetcher`（目标检查、重定向、重试、限流读取） |
//! | Data URL / Base64 | 解码前按长度估算体积，解码后校验签名 |
//! | 本地文件 | 存在性、metadata 体积、签名 |
//!
//! 签名校验用 `infer` 看 magic bytes，不信任扩展名和 Content-Type。

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

use super::remote::RemoteFetcher;
use super::source::RawImageData;
use super::{ImageConfig, ImageError, ImageHandler};

impl ImageHandler {
    pub(super) async fn load_from_url(
        &self,
        url: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("🌐 下载图片 - {}", redact_url_for_log(url));

        let bytes = RemoteFetcher::new(config)?.fetch(url).await?;
        Ok(RawImageData {
            bytes,
            source_hint: "url",
        })
    }

    pub(super) fn load_from_base64(
        &self,
        data: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("📝 解析 base64 图片 - {}", redact_url_for_log(data));

        let bytes = decode_base64_payload(data, config.max_file_size)?;
        ensure_within(bytes.len() as u64, config.max_file_size, "Base64 图片")?;
        check_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    pub(super) fn load_from_file(
        &self,
        path: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("📁 读取本地图片 - {}", path);

        let file_path = Path::new(path);
        let metadata = std::fs::metadata(file_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ImageError::FileSystem(format!("文件不存在：{}", path))
            } else {
                ImageError::FileSystem(format!("无法读取文件信息：{}", e))
            }
        })?;
        if !metadata.is_file() {
            return Err(ImageError::FileSystem(format!("不是文件：{}", path)));
        }
        ensure_within(metadata.len(), config.max_file_size, "本地图片")?;

        let bytes = std::fs::read(file_path).map_err(|e| ImageError::FileSystem(format!("读取失败：{}", e)))?;
        check_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }
}

/// 体积上限检查。
pub(super) fn ensure_within(len: u64, limit: u64, what: &str) -> Result<(), ImageError> {
    if len > limit {
        return Err(ImageError::ResourceLimit(format!(
            "{}过大：{:.2} MB（限制：{:.2} MB）",
            what,
            len as f64 / 1024.0 / 1024.0,
            limit as f64 / 1024.0 / 1024.0
        )));
    }
    Ok(())
}

/// magic bytes 必须识别为图片。
pub(super) fn check_signature(bytes: &[u8]) -> Result<(), ImageError> {
    let kind = infer::get(bytes).ok_or_else(|| {
        if bytes.is_empty() {
            ImageError::InvalidFormat("图片内容为空".to_string())
        } else {
            ImageError::InvalidFormat("无法识别图片类型".to_string())
        }
    })?;

    if kind.matcher_type() == infer::MatcherType::Image {
        Ok(())
    } else {
        Err(ImageError::InvalidFormat(format!("内容不是图片：{}", kind.mime_type())))
    }
}

/// 接受 `data:<mime>;base64,<payload>` 或纯 Base64。
fn decode_base64_payload(data: &str, limit: u64) -> Result<Vec<u8>, ImageError> {
    let trimmed = data.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| ImageError::InvalidFormat("Data URL 缺少数据段".to_string()))?;
            if !meta.ends_with(";base64") {
                return Err(ImageError::InvalidFormat("Data URL 不是 base64 编码".to_string()));
            }
            payload
        }
        None => trimmed,
    };

    // 每 4 个字符最多解出 3 字节
    let estimated = (payload.len() as u64).div_ceil(4).saturating_mul(3);
    ensure_within(estimated, limit, "Base64 图片")?;

    STANDARD
        .decode(payload)
        .map_err(|e| ImageError::Decode(format!("Base64 解码失败：{}", e)))
}

/// 日志用 URL 脱敏：去掉 query 与 fragment。
///
/// Data URL 只保留前缀，避免把整张图片写进日志。
pub fn redact_url_for_log(url: &str) -> String {
    if url.trim_start().starts_with("data:") {
        let prefix: String = url.trim_start().chars().take_while(|c| *c != ',').take(64).collect();
        return format!("{}…", prefix);
    }

    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    let host = parsed.host_str().unwrap_or("<unknown-host>");
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
}

/// 把错误信息里的完整 URL 换成脱敏版本。
pub(crate) fn sanitize_error_message_with_redacted_url(error_msg: &str, url: &str) -> String {
    error_msg.replace(url, &redact_url_for_log(url))
}
