//! 应用配置模块
//!
//! # 设计思路
//!
//! 原先每个页面变体各自硬编码接口地址、提示词、是否需要选择人设、是否允许上传等开关。
//! 这里统一收敛为一个 `BoothConfig`，所有变体共享同一条流水线，只靠配置区分行为。
//!
//! # 实现思路
//!
//! - 所有字段都有默认值（`#[serde(default)]`），配置文件可以只写需要覆盖的部分。
//! - 配置文件不存在时回落到默认配置；存在但解析失败时返回错误，不做静默兜底。
//! - `validate()` 在加载后统一校验，避免运行到一半才发现配置非法。

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::BoothError;
use crate::image_handler::ImageConfig;
use crate::layout::{CanvasSize, ScreenRect, ScreenSize};
use crate::session::Facing;
use crate::transform::TransformConfig;

/// 应用名只允许出现在文件名中安全的字符。
static APP_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("app name pattern must compile")
});

/// 页面变体开关。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// 进入取景前是否需要先选择人设（如性别）
    pub persona_gating: bool,
    /// 是否允许上传本地图片代替摄像头
    pub upload_enabled: bool,
    /// 是否显示分享按钮
    pub share_enabled: bool,
}

/// 品牌素材配置：位置字符串 + 预览界面上的渲染矩形。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandingAssetConfig {
    pub name: String,
    /// 本地路径、`http(s)://` 地址或 `data:` URL
    pub location: String,
    pub rect: ScreenRect,
}

/// 拍照应用总配置。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoothConfig {
    /// 导出文件名前缀
    pub app_name: String,
    /// 上传图片 letterbox 的目标画布，也是摄像头渲染尺寸
    pub canvas: CanvasSize,
    pub default_facing: Facing,
    /// 供应商特效（lens）标识，人设参数随它一起下发
    pub lens_id: Option<String>,
    pub personas: Vec<String>,
    pub features: FeatureFlags,
    pub transform: TransformConfig,
    pub branding: Vec<BrandingAssetConfig>,
    /// 预览区域在屏幕上的渲染尺寸，品牌素材矩形以它为基准
    pub preview_viewport: ScreenSize,
    /// 导出目录，未设置时使用当前目录下的 `exports`
    pub export_dir: Option<String>,
    pub images: ImageConfig,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            app_name: "orange-gem-ai".to_string(),
            canvas: CanvasSize::default(),
            default_facing: Facing::Front,
            lens_id: None,
            personas: Vec::new(),
            features: FeatureFlags {
                persona_gating: false,
                upload_enabled: true,
                share_enabled: false,
            },
            transform: TransformConfig::default(),
            branding: Vec::new(),
            preview_viewport: ScreenSize::default(),
            export_dir: None,
            images: ImageConfig::default(),
        }
    }
}

impl BoothConfig {
    /// 从 JSON 文件加载配置。
    ///
    /// # 返回
    /// - 文件不存在 → 默认配置
    /// - 解析失败或校验失败 → `Err(BoothError::Config)`
    pub fn load_from_path(path: &Path) -> Result<Self, BoothError> {
        if !path.exists() {
            log::info!("⚙️ 配置文件不存在，使用默认配置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| BoothError::Config(format!("解析配置文件失败: {}", e)))?;
        config.validate()?;

        log::info!("⚙️ 已加载配置: {}", path.display());
        Ok(config)
    }

    /// 将配置写回 JSON 文件（美化格式）。
    pub fn save_to_path(&self, path: &Path) -> Result<(), BoothError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| BoothError::Config(format!("序列化配置失败: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), BoothError> {
        if !APP_NAME_PATTERN.is_match(&self.app_name) {
            return Err(BoothError::Config(format!(
                "app_name 只能包含字母、数字、下划线和连字符: '{}'",
                self.app_name
            )));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(BoothError::Config("canvas 尺寸不能为 0".to_string()));
        }
        if self.features.persona_gating && self.personas.is_empty() {
            return Err(BoothError::Config(
                "启用 persona_gating 时 personas 不能为空".to_string(),
            ));
        }
        if self.preview_viewport.width <= 0.0 || self.preview_viewport.height <= 0.0 {
            return Err(BoothError::Config("preview_viewport 尺寸必须为正数".to_string()));
        }
        for asset in &self.branding {
            if asset.location.trim().is_empty() {
                return Err(BoothError::Config(format!("品牌素材 '{}' 缺少 location", asset.name)));
            }
        }

        self.transform.validate()?;
        self.images
            .validate()
            .map_err(|e| BoothError::Config(e.to_string()))?;

        Ok(())
    }
}
