//! # 配置模块
//!
//! ## 设计思路
//!
//! 将图片加载相关的“可调策略”集中到 `ImageConfig`，保证运行时行为可观测、可调整、可测试。
//! 该配置同时服务于三条链路：上传图片解码、生成结果图下载、品牌素材加载。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - 通过 serde 支持从 `BoothConfig` 的 `images` 字段反序列化，缺省字段回落到默认值。
//! - `validate` 在加载配置时做一次性范围检查，避免运行中才暴露非法参数。

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::ImageError;

/// 图片处理配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// 下载/读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 网络下载超时时间（秒）。
    pub download_timeout: u64,
    /// 建立连接（TCP/TLS）超时时间（秒）。
    pub connect_timeout: u64,
    /// 下载首包超时时间（毫秒）。
    pub stream_first_byte_timeout_ms: u64,
    /// 下载分块读取超时时间（毫秒）。
    pub stream_chunk_timeout_ms: u64,
    /// 最大重定向次数，避免无限跳转或恶意链路。
    pub max_redirects: usize,
    /// 是否允许访问内网或本地地址（默认关闭，防 SSRF）。
    pub allow_private_network: bool,
    /// 是否对域名执行 DNS 解析后再做内网 IP 拦截。
    pub resolve_dns_for_url_safety: bool,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 缩放滤镜策略（不参与序列化）。
    #[serde(skip, default = "default_resize_filter")]
    pub resize_filter: FilterType,
}

fn default_resize_filter() -> FilterType {
    FilterType::Triangle
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            download_timeout: 30,
            connect_timeout: 8,
            stream_first_byte_timeout_ms: 10_000,
            stream_chunk_timeout_ms: 15_000,
            max_redirects: 5,
            allow_private_network: false,
            resolve_dns_for_url_safety: true,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            resize_filter: default_resize_filter(),
        }
    }
}

impl ImageConfig {
    /// 校验参数范围。
    pub fn validate(&self) -> Result<(), ImageError> {
        if self.max_file_size == 0 {
            return Err(ImageError::InvalidFormat("max_file_size 不能为 0".to_string()));
        }
        if self.max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(ImageError::InvalidFormat("max_decoded_bytes 不能小于 8MB".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout) {
            return Err(ImageError::InvalidFormat("connect_timeout 必须在 1~120 秒之间".to_string()));
        }
        if !(1..=600).contains(&self.download_timeout) {
            return Err(ImageError::InvalidFormat("download_timeout 必须在 1~600 秒之间".to_string()));
        }
        if !(500..=120_000).contains(&self.stream_first_byte_timeout_ms) {
            return Err(ImageError::InvalidFormat(
                "stream_first_byte_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }
        if !(500..=120_000).contains(&self.stream_chunk_timeout_ms) {
            return Err(ImageError::InvalidFormat(
                "stream_chunk_timeout_ms 必须在 500~120000 毫秒之间".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ImageConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_connect_timeout() {
        let mut config = ImageConfig::default();
        config.connect_timeout = 0;

        assert!(matches!(config.validate(), Err(ImageError::InvalidFormat(_))));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: ImageConfig =
            serde_json::from_str(r#"{ "allow_private_network": true }"#).expect("parse failed");

        assert!(config.allow_private_network);
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.resize_filter, FilterType::Triangle);
    }
}
