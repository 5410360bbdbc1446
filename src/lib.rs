//! # 橙宝石拍照亭：库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │             宿主页面 / 无头命令行 (main.rs)               │
//! │    绑定控件 ── 读取 ViewState ── 渲染 SessionEvent        │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Result<T, BoothError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心 (Rust)                            │
//! │                                                          │
//! │  ┌─ session ──── CaptureSession 状态机                    │
//! │  │   ├─ source     帧来源选择 (摄像头 / 上传)            │
//! │  │   ├─ capture    拍摄结果 + 流水线阶段                  │
//! │  │   └─ shared     SharedSession 异步流程 + BusyGuard     │
//! │  │                                                       │
//! │  ├─ transform ── 远端生成接口 (reqwest)                    │
//! │  ├─ export ───── 品牌素材合成 + PNG 导出                  │
//! │  ├─ image_handler 图片下载·解码·缩放                      │
//! │  ├─ layout       letterbox / 屏幕坐标换算                  │
//! │  ├─ settings     BoothConfig (JSON)                       │
//! │  ├─ storage      导出目录                                  │
//! │  └─ error        BoothError 统一错误                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `BoothError`，所有对外操作的返回类型 |
//! | [`session`] | 拍照会话控制器：模式状态机、来源选择、拍摄、生成、导出编排 |
//! | [`transform`] | 构造生成请求、调用远端接口、按优先级解析输出地址 |
//! | [`export`] | 品牌素材按屏幕位置合成、PNG 编码与保存/分享 |
//! | [`image_handler`] | 从 URL/Base64/文件/内存加载图片，安全校验与解码限制 |
//! | [`layout`] | 纯几何计算 |
//! | [`settings`] | 配置加载、保存、校验 |
//! | [`storage`] | 导出目录的获取与自动创建 |

pub mod error;
pub mod export;
pub mod image_handler;
pub mod layout;
pub mod session;
pub mod settings;
pub mod storage;
pub mod transform;
