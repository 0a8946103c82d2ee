use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use animator_core::{
    AppViewModel, AspectRatio, GenerationRequest, JobFailure, SourceImage, VideoResult,
};
use animator_engine::{
    ensure_output_dir, FileAssetStore, GeminiProvider, JobMonitor, MonitorHandle,
};
use animator_logging::{animator_info, animator_warn};
use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::watch;

use super::config::{AppConfig, DEFAULT_CONFIG_FILE};
use super::credential::TerminalCredential;
use super::logging::{self, LogDestination};
use super::ui;

#[derive(Parser)]
#[command(name = "animator")]
#[command(about = "Animate a still image into a short video", long_about = None)]
struct Args {
    /// Source image (PNG, JPEG, WebP, ...)
    image: PathBuf,

    /// Text prompt; a canned prompt is used when omitted
    #[arg(long)]
    prompt: Option<String>,

    /// Aspect ratio of the video: 16:9 or 9:16
    #[arg(long, default_value = "16:9")]
    aspect_ratio: AspectRatio,

    /// Directory the finished video is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// RON configuration file (default: ./animator.ron when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_enum)]
    log: Option<LogDestination>,
}

pub async fn run_app() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path, true)?,
        None => AppConfig::load(Path::new(DEFAULT_CONFIG_FILE), false)?,
    };
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(destination) = args.log {
        config.log_destination = destination;
    }
    logging::initialize(config.log_destination, config.level_filter());
    animator_info!(
        "animator starting model={} output_dir={}",
        config.model,
        config.output_dir.display()
    );

    let image = read_image(&args.image)?;
    ensure_output_dir(&config.output_dir)?;

    let credential = Arc::new(TerminalCredential::from_env());
    let provider = GeminiProvider::new(config.gemini_settings(), credential.clone())?;
    let monitor = JobMonitor::spawn(
        Arc::new(provider),
        credential,
        Arc::new(FileAssetStore::new(config.output_dir.clone())),
        config.monitor_settings(),
    );
    let printer = tokio::spawn(print_views(monitor.subscribe()));

    let request = GenerationRequest::new(image, args.aspect_ratio)
        .with_prompt(args.prompt.unwrap_or_default());
    let outcome = tokio::select! {
        outcome = run_job(&monitor, request) => outcome,
        _ = tokio::signal::ctrl_c() => {
            animator_warn!("interrupted, abandoning job");
            Err(JobFailure::Abandoned)
        }
    };

    monitor.shutdown();
    // Drains the last views; ends once the monitor drops its sender.
    let _ = printer.await;

    match outcome {
        Ok(result) => {
            animator_info!("video stored at {}", result.asset_url);
            Ok(())
        }
        Err(failure) => bail!("generation failed: {failure}"),
    }
}

/// Submits once, and once more after a credential selection if the first
/// attempt was refused for lack of authorization.
async fn run_job(
    monitor: &MonitorHandle,
    request: GenerationRequest,
) -> Result<VideoResult, JobFailure> {
    match monitor.submit(request.clone()).await {
        Err(failure) if failure.needs_authorization() => {
            monitor.select_credential().await;
            monitor.submit(request).await
        }
        outcome => outcome,
    }
}

async fn print_views(mut views: watch::Receiver<AppViewModel>) {
    let mut last = Vec::new();
    while views.changed().await.is_ok() {
        let lines = ui::render::render(&views.borrow_and_update());
        if lines != last {
            for line in &lines {
                println!("{line}");
            }
            last = lines;
        }
    }
}

fn read_image(path: &Path) -> anyhow::Result<SourceImage> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        bail!("{} is not an image ({})", path.display(), mime);
    }
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(SourceImage {
        bytes,
        mime_type: mime.essence_str().to_string(),
    })
}
