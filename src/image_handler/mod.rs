//! # 图片处理模块（image_handler）
//!
//! ## 设计思路
//!
//! 拍照流程里有三处需要“把某个位置的图片变成 RGBA 位图”：
//! 用户上传的文件、生成接口返回的结果地址、品牌素材（logo / 标语）。
//! 该模块把“来源识别 → 加载校验 → 解码 → 缩放”按职责拆分为多个子模块，
//! 避免在会话控制器里散落网络与解码细节。
//!
//! - `handler`：编排整条加载流水线
//! - `loader`：负责 Base64/文件加载、签名与体积校验
//! - `remote`：负责远程下载（目标检查、重定向、重试、限流读取）
//! - `pipeline`：负责解码、像素限制、RGBA 缩放
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! session / export
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 签名/体积校验）
//!    │    └─ remote.rs（URL 下载 + 目标安全检查）
//!    └─ pipeline.rs（解码 + 像素限制 + 缩放）
//!    ↓
//! 返回 ImageError，由上层转为 BoothError
//! ```

mod config;
mod error;
mod handler;
mod loader;
mod pipeline;
mod remote;
mod source;

pub use config::ImageConfig;
pub use error::ImageError;
pub use handler::ImageHandler;
pub use loader::redact_url_for_log;
pub(crate) use loader::sanitize_error_message_with_redacted_url;
pub use pipeline::resize_rgba;
pub use source::{DecodedImage, ImageSource};
