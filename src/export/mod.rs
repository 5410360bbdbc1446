//! # 导出模块
//!
//! - `composite`：品牌素材按屏幕位置换算后叠加到拍摄结果上
//! - `file`：PNG 编码、`<app>-<时间戳>.png` 命名、保存/分享出口

mod composite;
mod file;

pub use composite::{composite, CompositeOutcome};
pub use file::{encode_png, export_file_name, DirectorySink, ExportSink, ExportedFile};
