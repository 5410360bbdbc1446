//! # 共享会话与异步流程
//!
//! ## 设计思路
//!
//! 控制器本身是同步的，`SharedSession` 把它放进 `Arc<Mutex<_>>`，
//! 负责跨越网络等待的流程（生成、导出）。锁只在状态迁移时短暂持有，
//! 等待网络期间不持锁，宿主仍可以随时重拍、上传或读取界面快照。
//!
//! ## BusyGuard
//!
//! 生成期间的忙碌标记由 RAII 守卫兜底：无论成功、失败，还是 future 被中途丢弃，
//! 守卫析构时都会清除忙碌状态；若会话仍停在本次生成的 `Processing`，则恢复到 `Captured`。

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::controller::{CaptureSession, TransformOutput, TransformTicket};
use super::mode::{Control, ViewState};
use crate::error::BoothError;
use crate::export::{composite, ExportSink, ExportedFile};
use crate::image_handler::{ImageHandler, ImageSource};
use crate::transform::RemoteTransformClient;

/// 生成流程的忙碌守卫。
struct BusyGuard {
    session: Arc<Mutex<CaptureSession>>,
    generation: u64,
}

impl BusyGuard {
    fn new(session: Arc<Mutex<CaptureSession>>, generation: u64) -> Self {
        Self { session, generation }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut session = match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        session.abandon_transform(self.generation);
    }
}

/// 可跨任务共享的会话句柄。
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<CaptureSession>>,
    client: Option<Arc<RemoteTransformClient>>,
    images: Arc<ImageHandler>,
}

impl SharedSession {
    pub fn new(session: CaptureSession) -> Result<Self, BoothError> {
        let transform = &session.config().transform;
        let client = if transform.is_enabled() {
            Some(Arc::new(RemoteTransformClient::new(transform)?))
        } else {
            None
        };
        let images = session.image_handler();

        Ok(Self {
            inner: Arc::new(Mutex::new(session)),
            client,
            images,
        })
    }

    /// 获取控制器锁；锁中毒映射为错误。
    pub fn lock(&self) -> Result<MutexGuard<'_, CaptureSession>, BoothError> {
        self.inner
            .lock()
            .map_err(|_| BoothError::Config("会话状态锁已损坏".to_string()))
    }

    pub fn view(&self) -> Result<ViewState, BoothError> {
        Ok(self.lock()?.view())
    }

    /// 生成：`Captured → Processing → Result`，接口失败回到 `Captured`。
    ///
    /// 等待期间发生重拍、拍摄或上传时，返回 `Ok` 但结果被丢弃（见 `complete_transform`）。
    pub async fn generate(&self, prompt: Option<&str>) -> Result<ViewState, BoothError> {
        let ticket = self.lock()?.begin_transform(prompt)?;
        let _guard = BusyGuard::new(self.inner.clone(), ticket.generation());

        let outcome = self.run_transform(&ticket).await;

        let mut session = self.lock()?;
        session.complete_transform(&ticket, outcome)?;
        Ok(session.view())
    }

    /// 下载：合成品牌素材后交给 `sink.save`。
    pub async fn download<S>(&self, sink: &S) -> Result<ExportedFile, BoothError>
    where
        S: ExportSink + ?Sized,
    {
        self.export(Control::Download, sink).await
    }

    /// 分享：与下载相同的合成图，交给 `sink.share`。
    pub async fn share<S>(&self, sink: &S) -> Result<ExportedFile, BoothError>
    where
        S: ExportSink + ?Sized,
    {
        self.export(Control::Share, sink).await
    }

    /// 接口失败才算生成失败；结果图加载失败随 `TransformOutput` 交给控制器处理。
    async fn run_transform(&self, ticket: &TransformTicket) -> Result<TransformOutput, BoothError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| BoothError::Config("未配置生成接口地址 transform.endpoint".to_string()))?;

        let result = client.transform(ticket.request()).await?;
        let image = match ImageSource::from_remote_location(&result.output_url) {
            Ok(source) => self.images.load(source).await.map_err(BoothError::from),
            Err(err) => Err(BoothError::from(err)),
        };
        Ok(TransformOutput {
            output_url: result.output_url,
            image,
        })
    }

    async fn export<S>(&self, control: Control, sink: &S) -> Result<ExportedFile, BoothError>
    where
        S: ExportSink + ?Sized,
    {
        let job = self.lock()?.prepare_export(control)?;

        let outcome = composite(&job.pixels, &job.branding, job.viewport, &self.images).await;
        if !outcome.skipped.is_empty() {
            let mut session = self.lock()?;
            for err in &outcome.skipped {
                session.report(err);
            }
        }

        let delivered = ExportedFile::encode(&job.app_name, Utc::now(), &outcome.image).and_then(|file| {
            let location = match control {
                Control::Share => sink.share(&file)?,
                _ => sink.save(&file)?,
            };
            Ok((file, location))
        });

        let mut session = self.lock()?;
        match delivered {
            Ok((file, location)) => {
                session.mark_exported(job.generation, file.file_name(), location);
                Ok(file)
            }
            Err(err) => {
                session.report(&err);
                Err(err)
            }
        }
    }
}
