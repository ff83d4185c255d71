//! 素材下载服务 - 业务能力层
//!
//! 只负责"把一部已完成漫画的封面和所有面板图片保存到本地目录"

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::clients::FileClient;
use crate::error::{AppError, AppResult, RemoteOperation};
use crate::models::comic::Comic;

static UNSAFE_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]+"#).expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Cover,
    Panel,
}

/// 需要下载的一张图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub kind: AssetKind,
    pub url: String,
    pub file_name: String,
}

/// 只在两张面板之间停顿，封面前后不等待
fn needs_pause(previous: Option<&Asset>, next: &Asset) -> bool {
    matches!(
        (previous.map(|a| a.kind), next.kind),
        (Some(AssetKind::Panel), AssetKind::Panel)
    )
}

/// 下载结果
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
}

/// 素材下载服务
pub struct AssetDownloader {
    files: FileClient,
    /// 两次面板下载之间的间隔
    delay: Duration,
}

impl AssetDownloader {
    pub fn new(delay: Duration) -> Self {
        Self {
            files: FileClient::new(),
            delay,
        }
    }

    /// 列出需要下载的图片：先封面，再按页、按面板顺序
    pub fn plan(comic: &Comic) -> Vec<Asset> {
        let title = sanitize_file_stem(&comic.title);
        let mut assets = Vec::with_capacity(comic.panel_count() + 1);

        if let Some(cover) = comic.cover_image_url.as_deref().filter(|u| !u.is_empty()) {
            assets.push(Asset {
                kind: AssetKind::Cover,
                url: cover.to_string(),
                file_name: format!("{}_cover.jpg", title),
            });
        }

        for page in &comic.script {
            for panel in &page.panels {
                if panel.image_url.is_empty() {
                    continue;
                }
                assets.push(Asset {
                    kind: AssetKind::Panel,
                    url: panel.image_url.clone(),
                    file_name: format!(
                        "{}_page{}_panel{}.jpg",
                        title, page.page_number, panel.panel_number
                    ),
                });
            }
        }

        assets
    }

    /// 依次下载全部图片
    ///
    /// 任意一张失败即停止，已保存的文件保留
    pub async fn download_all(&self, comic: &Comic, out_dir: &Path) -> AppResult<DownloadReport> {
        if !comic.is_readable() {
            return Err(AppError::validation(format!(
                "漫画 {} 尚未完成 (状态: {})，无法下载",
                comic.id, comic.status
            )));
        }

        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| AppError::io(out_dir.display().to_string(), e))?;

        let assets = Self::plan(comic);
        info!("📥 开始下载 {} 张图片到 {}", assets.len(), out_dir.display());

        let mut report = DownloadReport::default();
        let mut previous: Option<&Asset> = None;
        for asset in &assets {
            if !self.delay.is_zero() && needs_pause(previous, asset) {
                sleep(self.delay).await;
            }
            previous = Some(asset);

            debug!("下载 {} -> {}", asset.url, asset.file_name);
            let bytes = self
                .files
                .fetch_bytes(&asset.url, RemoteOperation::AssetDownload)
                .await?;

            let target = out_dir.join(&asset.file_name);
            tokio::fs::write(&target, bytes)
                .await
                .map_err(|e| AppError::io(target.display().to_string(), e))?;
            report.saved.push(target);
        }

        info!("✓ 已下载 {} 张图片", report.saved.len());
        Ok(report)
    }
}

/// 把标题变成安全的文件名前缀
pub fn sanitize_file_stem(title: &str) -> String {
    let cleaned = UNSAFE_FILE_CHARS.replace_all(title.trim(), "_").to_string();

    if cleaned.is_empty() {
        "comic".to_string()
    } else {
        cleaned
    }
}
