//! # 界面模式状态机
//!
//! ## 设计思路
//!
//! 每个模式对应一组固定的可用控件，控件集合完全由 `(模式, 功能开关)` 推导，
//! 不单独维护“按钮是否显示”的状态，切换模式时也就不会遗留上一模式的控件。
//!
//! 取景画面与预览画面互斥：`VisibleSurface` 是单值枚举，同样由模式推导。

use std::collections::BTreeSet;

use serde::Serialize;

use super::capture::PipelineStage;
use super::source::Facing;
use crate::settings::FeatureFlags;

/// 会话模式，任意时刻只有一个取值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Bootstrapping,
    AwaitingProfileSelection,
    Live,
    Captured,
    Processing,
    Result,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bootstrapping => "bootstrapping",
            Self::AwaitingProfileSelection => "awaiting_profile_selection",
            Self::Live => "live",
            Self::Captured => "captured",
            Self::Processing => "processing",
            Self::Result => "result",
        }
    }

    /// 当前模式下应显示的画面。
    pub fn surface(self) -> VisibleSurface {
        match self {
            Self::Bootstrapping | Self::AwaitingProfileSelection | Self::Live => VisibleSurface::Live,
            Self::Captured | Self::Processing | Self::Result => VisibleSurface::Preview,
        }
    }
}

/// 宿主页面可绑定的控件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Capture,
    Upload,
    Generate,
    Download,
    Retake,
    Share,
    SelectPersona,
}

/// 某一时刻启用的控件集合。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ControlSet(BTreeSet<Control>);

impl ControlSet {
    pub fn contains(&self, control: Control) -> bool {
        self.0.contains(&control)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Control> + '_ {
        self.0.iter().copied()
    }

    fn with(mut self, control: Control, enabled: bool) -> Self {
        if enabled {
            self.0.insert(control);
        }
        self
    }
}

/// 可见画面：实时取景或静态预览，二者互斥。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSurface {
    Live,
    Preview,
}

/// 供宿主绑定的界面快照。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub mode: SessionMode,
    pub controls: ControlSet,
    pub surface: VisibleSurface,
    pub busy: bool,
    pub stage: PipelineStage,
    pub persona: Option<String>,
    pub facing: Option<Facing>,
}

/// 模式 → 可用控件表。
///
/// `transform_enabled` 为 false（未配置生成接口）时不出现生成按钮。
pub fn controls_for(mode: SessionMode, features: &FeatureFlags, transform_enabled: bool) -> ControlSet {
    let set = ControlSet::default();
    match mode {
        SessionMode::Bootstrapping => set,
        SessionMode::AwaitingProfileSelection => set.with(Control::SelectPersona, true),
        SessionMode::Live => set
            .with(Control::Capture, true)
            .with(Control::Upload, features.upload_enabled),
        SessionMode::Captured => set
            .with(Control::Generate, transform_enabled)
            .with(Control::Download, true)
            .with(Control::Retake, true)
            .with(Control::Share, features.share_enabled),
        SessionMode::Processing => set
            .with(Control::Capture, true)
            .with(Control::Upload, features.upload_enabled)
            .with(Control::Retake, true),
        SessionMode::Result => set
            .with(Control::Download, true)
            .with(Control::Retake, true)
            .with(Control::Share, features.share_enabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_features() -> FeatureFlags {
        FeatureFlags {
            persona_gating: true,
            upload_enabled: true,
            share_enabled: true,
        }
    }

    #[test]
    fn bootstrapping_enables_nothing() {
        assert!(controls_for(SessionMode::Bootstrapping, &all_features(), true).is_empty());
    }

    #[test]
    fn processing_blocks_generate_and_export_only() {
        let controls = controls_for(SessionMode::Processing, &all_features(), true);

        assert_eq!(
            controls.iter().collect::<Vec<_>>(),
            vec![Control::Capture, Control::Upload, Control::Retake]
        );
        let without_upload = controls_for(SessionMode::Processing, &FeatureFlags::default(), true);
        assert!(!without_upload.contains(Control::Upload));
    }

    #[test]
    fn feature_flags_hide_optional_controls() {
        let features = FeatureFlags::default();

        let live = controls_for(SessionMode::Live, &features, true);
        let captured = controls_for(SessionMode::Captured, &features, false);

        assert!(live.contains(Control::Capture));
        assert!(!live.contains(Control::Upload));
        assert!(!captured.contains(Control::Share));
        assert!(!captured.contains(Control::Generate));
        assert!(captured.contains(Control::Download));
    }

    #[test]
    fn capture_and_generate_never_share_a_mode() {
        let modes = [
            SessionMode::Bootstrapping,
            SessionMode::AwaitingProfileSelection,
            SessionMode::Live,
            SessionMode::Captured,
            SessionMode::Processing,
            SessionMode::Result,
        ];

        for mode in modes {
            let controls = controls_for(mode, &all_features(), true);
            assert!(!(controls.contains(Control::Capture) && controls.contains(Control::Generate)));
            assert!(!(controls.contains(Control::Capture) && controls.contains(Control::Download)));
        }
    }

    #[test]
    fn preview_surface_follows_captured_modes() {
        assert_eq!(SessionMode::Live.surface(), VisibleSurface::Live);
        assert_eq!(SessionMode::Processing.surface(), VisibleSurface::Preview);
        assert_eq!(SessionMode::Result.surface(), VisibleSurface::Preview);
    }

    #[test]
    fn controls_serialize_as_snake_case_list() {
        let controls = controls_for(SessionMode::Result, &all_features(), true);

        let json = serde_json::to_string(&controls).expect("serialize failed");
        assert_eq!(json, r#"["download","retake","share"]"#);
    }
}
