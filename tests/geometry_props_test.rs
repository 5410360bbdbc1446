//! 几何与导出文件名的性质测试。

use chrono::{TimeZone, Utc};
use orange_gem_booth::export::export_file_name;
use orange_gem_booth::layout::{letterbox_rect, scale_to_image, CanvasSize, ScreenRect, ScreenSize};
use proptest::prelude::*;
use regex::Regex;

proptest! {
    #[test]
    fn letterbox_stays_inside_canvas_and_fills_one_axis(
        src_w in 1u32..6000,
        src_h in 1u32..6000,
        canvas_w in 1u32..3000,
        canvas_h in 1u32..3000,
    ) {
        let canvas = CanvasSize::new(canvas_w, canvas_h);
        let rect = letterbox_rect(src_w, src_h, canvas);

        prop_assert!(rect.x >= 0 && rect.y >= 0);
        prop_assert!(rect.x as u64 + rect.width as u64 <= canvas_w as u64);
        prop_assert!(rect.y as u64 + rect.height as u64 <= canvas_h as u64);
        prop_assert!(rect.width == canvas_w || rect.height == canvas_h);
    }

    #[test]
    fn letterbox_is_centered(
        src_w in 1u32..6000,
        src_h in 1u32..6000,
        canvas_w in 1u32..3000,
        canvas_h in 1u32..3000,
    ) {
        let rect = letterbox_rect(src_w, src_h, CanvasSize::new(canvas_w, canvas_h));

        let left = rect.x as u64;
        let right = canvas_w as u64 - rect.width as u64 - left;
        let top = rect.y as u64;
        let bottom = canvas_h as u64 - rect.height as u64 - top;
        prop_assert!(right.abs_diff(left) <= 1);
        prop_assert!(bottom.abs_diff(top) <= 1);
    }

    #[test]
    fn full_viewport_rect_maps_to_full_image(
        view_w in 1.0f64..4000.0,
        view_h in 1.0f64..4000.0,
        img_w in 1u32..5000,
        img_h in 1u32..5000,
    ) {
        let rect = ScreenRect { x: 0.0, y: 0.0, width: view_w, height: view_h };
        let viewport = ScreenSize { width: view_w, height: view_h };

        let scaled = scale_to_image(rect, viewport, CanvasSize::new(img_w, img_h));

        prop_assert_eq!(scaled.map(|r| (r.x, r.y, r.width, r.height)), Some((0, 0, img_w, img_h)));
    }

    #[test]
    fn export_names_match_download_pattern(
        app_name in "[A-Za-z0-9_-]{1,32}",
        secs in 0i64..4_102_444_800,
    ) {
        let pattern = Regex::new(r"^[A-Za-z0-9_-]+-\d{4}-\d{2}-\d{2}T\d{2}-\d{2}-\d{2}\.png$").expect("regex");
        let at = Utc.timestamp_opt(secs, 0).single().expect("valid timestamp");

        let name = export_file_name(&app_name, at);

        prop_assert!(pattern.is_match(&name), "unexpected name {}", name);
        prop_assert!(!name.contains(':'));
    }
}
