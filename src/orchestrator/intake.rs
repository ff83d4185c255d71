//! 新建漫画 - 编排层
//!
//! 校验参数 → 上传文件 → 创建 status = uploading 的记录

use std::path::Path;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::comic::{
    Comic, ComicStatus, NewComic, ACCEPTED_EXTENSIONS, DEFAULT_PAGE_COUNT, MAX_PAGE_COUNT,
    MIN_PAGE_COUNT,
};
use crate::models::humor::HumorStyle;
use crate::services::{ComicStore, FileStorage};

/// 用户填写的漫画参数
#[derive(Debug, Clone, PartialEq)]
pub struct ComicParams {
    pub title: String,
    pub topic: String,
    pub humor_style: HumorStyle,
    pub page_count: u32,
}

impl ComicParams {
    pub fn new(title: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            topic: topic.into(),
            humor_style: HumorStyle::default(),
            page_count: DEFAULT_PAGE_COUNT,
        }
    }

    /// 校验参数，返回去掉首尾空白的副本
    pub fn validated(&self) -> AppResult<Self> {
        let title = self.title.trim();
        let topic = self.topic.trim();

        if title.is_empty() {
            return Err(AppError::validation("标题不能为空"));
        }
        if topic.is_empty() {
            return Err(AppError::validation("主题不能为空"));
        }
        if !(MIN_PAGE_COUNT..=MAX_PAGE_COUNT).contains(&self.page_count) {
            return Err(AppError::validation(format!(
                "页数必须在 {} 到 {} 之间，当前为 {}",
                MIN_PAGE_COUNT, MAX_PAGE_COUNT, self.page_count
            )));
        }

        Ok(Self {
            title: title.to_string(),
            topic: topic.to_string(),
            ..self.clone()
        })
    }
}

/// 检查文件扩展名是否允许上传
pub fn check_extension(path: &Path) -> AppResult<()> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "不支持的文件类型 '{}'，可选: {}",
            path.display(),
            ACCEPTED_EXTENSIONS.join(", ")
        )))
    }
}

/// 提交一本新漫画
pub async fn submit(
    store: &dyn ComicStore,
    storage: &dyn FileStorage,
    params: &ComicParams,
    file: &Path,
) -> AppResult<Comic> {
    let params = params.validated()?;
    check_extension(file)?;

    info!("📤 正在上传 {}", file.display());
    let uploaded_file_url = storage.upload(file).await?;

    let comic = store
        .create(NewComic {
            title: params.title,
            topic: params.topic,
            humor_style: params.humor_style,
            page_count: params.page_count,
            uploaded_file_url,
            status: ComicStatus::Uploading,
        })
        .await?;

    info!("✓ 已创建漫画 {} 《{}》", comic.id, comic.title);
    Ok(comic)
}
