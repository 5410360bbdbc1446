//! # 远端生成模块（transform）
//!
//! ## 设计思路
//!
//! 把“拍好的照片 + 提示词 → 生成后的图片地址”这一步隔离成独立模块：
//!
//! - `request`：请求体构造（两种图片字段写法）
//! - `response`：有序策略解析输出地址
//! - `client`：HTTP 调用与错误映射
//!
//! 会话控制器只依赖 `RemoteTransformClient::transform`，不关心请求/响应细节。

mod client;
mod request;
mod response;

use serde::{Deserialize, Serialize};

use crate::error::BoothError;

pub use client::{RemoteTransformClient, TransformResult};
pub use request::{RequestShape, TransformRequest};
pub use response::extract_output_url;

/// 生成接口配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// POST 地址；为空时不启用生成功能
    pub endpoint: String,
    pub prompt: String,
    pub request_shape: RequestShape,
    /// 整体请求超时（秒），生成模型通常较慢
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            prompt: "Turn this photo into a glossy orange gem portrait, keep the face recognizable"
                .to_string(),
            request_shape: RequestShape::default(),
            timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

impl TransformConfig {
    pub fn is_enabled(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), BoothError> {
        if self.is_enabled() {
            let url = reqwest::Url::parse(self.endpoint.trim())
                .map_err(|e| BoothError::Config(format!("生成接口地址无效: {}", e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(BoothError::Config("生成接口只支持 HTTP/HTTPS".to_string()));
            }
        }
        if !(1..=900).contains(&self.timeout_secs) {
            return Err(BoothError::Config("transform.timeout_secs 必须在 1~900 秒之间".to_string()));
        }
        if !(1..=120).contains(&self.connect_timeout_secs) {
            return Err(BoothError::Config(
                "transform.connect_timeout_secs 必须在 1~120 秒之间".to_string(),
            ));
        }

        Ok(())
    }
}
