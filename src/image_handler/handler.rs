//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageHandler` 只负责流程编排与配置管理，不关心图片最终用于上传、结果回填还是品牌合成。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节
//! 3. 解码为 RGBA
//!
//! ## 实现思路
//!
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/decode/total` 阶段耗时，便于性能诊断。

use std::time::Instant;

use super::loader::{check_signature, ensure_within};
use super::source::{DecodedImage, RawImageData};
use super::{ImageConfig, ImageError, ImageSource};

/// 图片加载器。
#[derive(Debug)]
pub struct ImageHandler {
    config: ImageConfig,
}

impl ImageHandler {
    /// 根据初始配置创建处理器。
    ///
    /// # 示例
    /// ```rust,ignore
    /// use orange_gem_booth::image_handler::{ImageConfig, ImageHandler};
    ///
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// # Ok::<(), orange_gem_booth::image_handler::ImageError>(())
    /// ```
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 获取配置快照。
    pub fn config_snapshot(&self) -> ImageConfig {
        self.config.clone()
    }

    /// 处理主入口：从任意来源加载并解码图片。
    pub async fn load(&self, source: ImageSource) -> Result<DecodedImage, ImageError> {
        let config = self.config_snapshot();
        let total_start = Instant::now();
        let kind = source.kind();

        let load_start = Instant::now();
        let raw = match source {
            ImageSource::Url(url) => self.load_from_url(&url, &config).await?,
            ImageSource::Base64(data) => self.load_from_base64(&data, &config)?,
            ImageSource::FilePath(path) => self.load_from_file(&path, &config)?,
            ImageSource::Bytes(bytes) => self.load_from_bytes(bytes, &config)?,
        };
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let decoded = self.decode_raw(raw, &config)?;
        let decode_elapsed = decode_start.elapsed();

        log::info!(
            "✅ 图片加载完成 - 来源: {} load={}ms decode={}ms total={}ms",
            kind,
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(decoded)
    }

    /// 同步解码内存字节（上传文件走这里，不经过网络）。
    pub fn decode_bytes(&self, bytes: Vec<u8>) -> Result<DecodedImage, ImageError> {
        let config = self.config_snapshot();
        let raw = self.load_from_bytes(bytes, &config)?;
        self.decode_raw(raw, &config)
    }

    fn load_from_bytes(&self, bytes: Vec<u8>, config: &ImageConfig) -> Result<RawImageData, ImageError> {
        ensure_within(bytes.len() as u64, config.max_file_size, "上传图片")?;
        check_signature(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint: "bytes",
        })
    }
}
