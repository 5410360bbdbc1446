//! 导出目录管理模块
//!
//! # 设计思路
//!
//! 统一管理导出图片的保存路径，支持配置自定义目录，
//! 并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用配置中的 `export_dir`。
//! - 未设置时回退到当前工作目录下的 `exports` 子目录。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::error::BoothError;

/// 未配置时使用的导出子目录名
pub const DEFAULT_EXPORT_DIR: &str = "exports";

/// 导出目录信息
#[derive(Debug, Clone, Serialize)]
pub struct StorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 获取导出目录
///
/// # 参数
/// * `custom_dir` - 配置中的自定义目录（可选，空字符串视为未设置）
///
/// # 返回
/// - `Ok(PathBuf)`：可用的导出目录
/// - `Err(BoothError::Export)`：无法创建目录
pub fn resolve_exports_dir(custom_dir: Option<&str>) -> Result<PathBuf, BoothError> {
    let path = match custom_dir.map(str::trim).filter(|d| !d.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(DEFAULT_EXPORT_DIR),
    };

    if !path.exists() {
        fs::create_dir_all(&path).map_err(|e| {
            BoothError::Export(format!("创建导出目录 '{}' 失败: {}", path.display(), e))
        })?;
    }
    Ok(path)
}

/// 获取导出目录信息（路径 + 占用大小 + PNG 文件数）
pub fn exports_dir_info(custom_dir: Option<&str>) -> Result<StorageInfo, BoothError> {
    let dir = resolve_exports_dir(custom_dir)?;
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    if let Ok(entries) = fs::read_dir(&dir) {
        for entry in entries.flatten() {
            let is_png = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if !is_png {
                continue;
            }
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    total_size += metadata.len();
                    file_count += 1;
                }
            }
        }
    }

    Ok(StorageInfo {
        path: dir.to_string_lossy().to_string(),
        total_size,
        file_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_custom_dir() {
        let root = tempfile::tempdir().expect("tempdir failed");
        let target = root.path().join("a").join("b");

        let resolved = resolve_exports_dir(Some(&target.to_string_lossy())).expect("resolve failed");

        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }

    #[test]
    fn info_counts_only_png_files() {
        let root = tempfile::tempdir().expect("tempdir failed");
        fs::write(root.path().join("one.png"), [1u8, 2, 3]).expect("write failed");
        fs::write(root.path().join("two.PNG"), [1u8]).expect("write failed");
        fs::write(root.path().join("notes.txt"), [1u8; 10]).expect("write failed");

        let info = exports_dir_info(Some(&root.path().to_string_lossy())).expect("info failed");

        assert_eq!(info.file_count, 2);
        assert_eq!(info.total_size, 4);
    }
}
