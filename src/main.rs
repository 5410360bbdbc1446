//! # 橙宝石拍照亭：无头入口
//!
//! 没有摄像头时也能跑完整条流水线：读取本地照片 → 上传 → （生成）→ 合成并导出。
//! 业务逻辑都在库里，这里只负责参数解析、日志初始化与流程串联。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use orange_gem_booth::error::BoothError;
use orange_gem_booth::export::DirectorySink;
use orange_gem_booth::session::{
    CaptureSession, Effect, Facing, FrameProducer, LiveSourceProvider, SessionEvent, SessionMode,
    SharedSession,
};
use orange_gem_booth::settings::BoothConfig;
use orange_gem_booth::storage;

#[derive(Debug, Parser)]
#[command(name = "orange-gem-booth", version, about = "Headless photo booth pipeline")]
struct Cli {
    /// 配置文件（JSON），不存在时使用默认配置
    #[arg(long, default_value = "booth.json")]
    config: PathBuf,

    /// 要处理的照片
    #[arg(long)]
    photo: PathBuf,

    /// 覆盖配置中的提示词
    #[arg(long)]
    prompt: Option<String>,

    /// 跳过远端生成，直接合成导出
    #[arg(long)]
    skip_transform: bool,

    /// 覆盖导出目录
    #[arg(long)]
    out: Option<PathBuf>,

    /// 需要选择人设时使用的值，默认取配置中的第一个
    #[arg(long)]
    persona: Option<String>,
}

/// 没有摄像头的来源提供方，只支持上传。
struct HeadlessProvider;

impl LiveSourceProvider for HeadlessProvider {
    fn create_session(&mut self) -> Result<(), BoothError> {
        Ok(())
    }

    fn open_camera(&mut self, facing: Facing) -> Result<Box<dyn FrameProducer>, BoothError> {
        Err(BoothError::MediaAccess(format!("无头模式没有可用的摄像头 ({:?})", facing)))
    }

    fn apply_effect(&mut self, effect: &Effect) -> Result<(), BoothError> {
        log::debug!("无头模式忽略特效: {} {:?}", effect.id, effect.params);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("❌ [{}] {}", err.code(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<PathBuf, BoothError> {
    let mut config = BoothConfig::load_from_path(&cli.config)?;
    if let Some(out) = &cli.out {
        config.export_dir = Some(out.to_string_lossy().to_string());
    }
    if !config.features.upload_enabled {
        log::info!("⚙️ 无头模式强制启用上传");
        config.features.upload_enabled = true;
    }
    let export_dir = config.export_dir.clone();
    let first_persona = config.personas.first().cloned();

    let mut session = CaptureSession::new(config, Box::new(HeadlessProvider))?;
    session.start()?;

    if session.mode() == SessionMode::AwaitingProfileSelection {
        let persona = cli
            .persona
            .or(first_persona)
            .ok_or_else(|| BoothError::Config("需要选择人设，但没有可用的人设".to_string()))?;
        session.select_persona(&persona)?;
    }

    let bytes = std::fs::read(&cli.photo)?;
    session.upload(bytes)?;

    let shared = SharedSession::new(session)?;
    let transform_enabled = shared.lock()?.config().transform.is_enabled();
    if cli.skip_transform || !transform_enabled {
        log::info!("⏭️ 跳过远端生成");
    } else {
        shared.generate(cli.prompt.as_deref()).await?;
    }

    let sink = DirectorySink::from_config(export_dir.as_deref())?;
    let file = shared.download(&sink).await?;

    for event in shared.lock()?.take_events() {
        match event {
            SessionEvent::Notice(notice) => log::warn!("📣 [{}] {}", notice.code, notice.message),
            other => log::debug!("{:?}", other),
        }
    }

    let info = storage::exports_dir_info(export_dir.as_deref())?;
    log::info!(
        "📂 导出目录 {} 共 {} 个文件 ({} bytes)",
        info.path,
        info.file_count,
        info.total_size
    );

    Ok(sink.dir().join(file.file_name()))
}
