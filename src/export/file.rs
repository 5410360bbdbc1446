//! 导出文件：PNG 编码、文件命名、保存/分享出口。

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::{ImageFormat, RgbaImage};

use crate::error::BoothError;
use crate::storage::resolve_exports_dir;

/// `<app_name>-<YYYY-MM-DDTHH-MM-SS>.png`，时间中的 `:` 换成 `-`。
pub fn export_file_name(app_name: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.png", app_name, at.format("%Y-%m-%dT%H-%M-%S"))
}

/// 将位图编码为 PNG。
pub fn encode_png(image: &RgbaImage) -> Result<Bytes, BoothError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| BoothError::Export(format!("PNG 编码失败: {}", e)))?;
    Ok(Bytes::from(buffer.into_inner()))
}

/// 一个待保存的导出文件。
///
/// 内容是引用计数的 `Bytes`，交给多个出口时不会复制整张图。
#[derive(Debug, Clone)]
pub struct ExportedFile {
    file_name: String,
    bytes: Bytes,
    width: u32,
    height: u32,
}

impl ExportedFile {
    pub fn encode(app_name: &str, at: DateTime<Utc>, image: &RgbaImage) -> Result<Self, BoothError> {
        Ok(Self {
            file_name: export_file_name(app_name, at),
            bytes: encode_png(image)?,
            width: image.width(),
            height: image.height(),
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mime_type(&self) -> &'static str {
        "image/png"
    }
}

/// 导出出口（下载 / 分享）。
pub trait ExportSink: Send + Sync {
    /// 保存文件，返回落盘位置（若有）。
    fn save(&self, file: &ExportedFile) -> Result<Option<PathBuf>, BoothError>;

    /// 分享文件；没有分享渠道的出口退化为保存。
    fn share(&self, file: &ExportedFile) -> Result<Option<PathBuf>, BoothError> {
        self.save(file)
    }
}

/// 保存到本地目录。
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 使用配置中的导出目录（不存在时自动创建）。
    pub fn from_config(custom_dir: Option<&str>) -> Result<Self, BoothError> {
        Ok(Self::new(resolve_exports_dir(custom_dir)?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ExportSink for DirectorySink {
    fn save(&self, file: &ExportedFile) -> Result<Option<PathBuf>, BoothError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        let path = self.dir.join(file.file_name());
        fs::write(&path, &file.bytes)?;
        log::info!(
            "💾 已保存 {} ({} bytes, {}x{})",
            path.display(),
            file.len(),
            file.width,
            file.height
        );
        Ok(Some(path))
    }
}
