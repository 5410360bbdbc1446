//! # 请求构造模块
//!
//! 生成接口的请求体是 `{ input: { ..., prompt } }`，图片字段有两种写法：
//! - `image_input: [dataUrl]`（数组，默认）
//! - `image: dataUrl`（单值）
//!
//! 请求对象按次构造，响应处理完即丢弃，不在会话里保留。

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// 请求体中图片字段的写法。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestShape {
    #[default]
    ImageInputArray,
    SingleImage,
}

/// 一次生成请求。
#[derive(Debug, Clone)]
pub struct TransformRequest {
    /// `data:image/png;base64,...`
    pub image_data_url: String,
    pub prompt: String,
}

impl TransformRequest {
    pub fn new(image_data_url: String, prompt: impl Into<String>) -> Self {
        Self {
            image_data_url,
            prompt: prompt.into(),
        }
    }

    /// 按配置的写法生成 JSON 请求体。
    pub fn to_body(&self, shape: RequestShape) -> Value {
        match shape {
            RequestShape::ImageInputArray => json!({
                "input": {
                    "image_input": [self.image_data_url],
                    "prompt": self.prompt,
                }
            }),
            RequestShape::SingleImage => json!({
                "input": {
                    "image": self.image_data_url,
                    "prompt": self.prompt,
                }
            }),
        }
    }
}
