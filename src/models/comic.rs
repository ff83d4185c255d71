use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::humor::HumorStyle;
use crate::models::script::Page;

/// 页数下限
pub const MIN_PAGE_COUNT: u32 = 3;
/// 页数上限
pub const MAX_PAGE_COUNT: u32 = 20;
/// 默认页数
pub const DEFAULT_PAGE_COUNT: u32 = 8;
/// 允许上传的文件扩展名
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["pdf", "pptx", "docx", "txt", "md"];

/// 漫画生成状态
///
/// 只会向前推进；failed 可以从任意进行中状态到达，且是终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComicStatus {
    Uploading,
    Extracting,
    Scripting,
    GeneratingImages,
    Completed,
    Failed,
}

impl ComicStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ComicStatus::Uploading => "uploading",
            ComicStatus::Extracting => "extracting",
            ComicStatus::Scripting => "scripting",
            ComicStatus::GeneratingImages => "generating_images",
            ComicStatus::Completed => "completed",
            ComicStatus::Failed => "failed",
        }
    }

    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, ComicStatus::Completed | ComicStatus::Failed)
    }

}

impl std::fmt::Display for ComicStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 漫画记录（唯一的领域实体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comic {
    /// 由存储分配的不透明 ID
    pub id: String,
    pub title: String,
    pub topic: String,
    pub humor_style: HumorStyle,
    pub page_count: u32,
    pub uploaded_file_url: String,
    pub status: ComicStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_summary: Option<String>,
    /// 只有 status = completed 时才有意义
    #[serde(default)]
    pub script: Vec<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    /// 只有 status = failed 时存在；为空时也写出 null，保证远程记录能被清空
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    /// 乐观锁版本号，每次成功更新 +1
    #[serde(default = "initial_version")]
    pub version: u64,
}

fn initial_version() -> u64 {
    1
}

impl Comic {
    /// 根据新建参数生成记录（ID 由存储决定）
    pub fn from_new(id: impl Into<String>, new: NewComic, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: new.title,
            topic: new.topic,
            humor_style: new.humor_style,
            page_count: new.page_count,
            uploaded_file_url: new.uploaded_file_url,
            status: new.status,
            academic_summary: None,
            script: Vec::new(),
            cover_image_url: None,
            error_message: None,
            created_date: now,
            updated_date: now,
            version: initial_version(),
        }
    }

    /// 应用一次部分更新，版本号 +1
    pub fn apply(&mut self, patch: ComicPatch, now: DateTime<Utc>) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(summary) = patch.academic_summary {
            self.academic_summary = Some(summary);
        }
        if let Some(script) = patch.script {
            self.script = script;
        }
        if let Some(cover) = patch.cover_image_url {
            self.cover_image_url = Some(cover);
        }
        if let Some(error_message) = patch.error_message {
            self.error_message = error_message;
        }
        self.updated_date = now;
        self.version += 1;
    }

    /// 漫画是否可以阅读
    pub fn is_readable(&self) -> bool {
        self.status == ComicStatus::Completed
    }

    /// 全部面板数量
    pub fn panel_count(&self) -> usize {
        self.script.iter().map(|page| page.panels.len()).sum()
    }
}

/// 新建漫画的字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComic {
    pub title: String,
    pub topic: String,
    pub humor_style: HumorStyle,
    pub page_count: u32,
    pub uploaded_file_url: String,
    pub status: ComicStatus,
}

/// 部分更新（稀疏字段映射）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComicPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ComicStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Vec<Page>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    /// `Some(None)` 表示清空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<Option<String>>,
}

impl ComicPatch {
    /// 只修改状态
    pub fn status(status: ComicStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// 开始新一轮生成：状态推进，同时清掉上一次的错误信息
    pub fn restart(status: ComicStatus) -> Self {
        Self {
            status: Some(status),
            error_message: Some(None),
            ..Default::default()
        }
    }

    pub fn summary(summary: impl Into<String>) -> Self {
        Self {
            academic_summary: Some(summary.into()),
            ..Default::default()
        }
    }

    /// 完成：脚本 + 封面 + completed 一次写入
    pub fn completed(script: Vec<Page>, cover_image_url: impl Into<String>) -> Self {
        Self {
            status: Some(ComicStatus::Completed),
            script: Some(script),
            cover_image_url: Some(cover_image_url.into()),
            ..Default::default()
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: Some(ComicStatus::Failed),
            error_message: Some(Some(error_message.into())),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Comic {
        Comic::from_new(
            "c1",
            NewComic {
                title: "Cells".to_string(),
                topic: "Biology".to_string(),
                humor_style: HumorStyle::Witty,
                page_count: 3,
                uploaded_file_url: "file:///tmp/cells.txt".to_string(),
                status: ComicStatus::Uploading,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&ComicStatus::GeneratingImages).unwrap();
        assert_eq!(json, "\"generating_images\"");
        assert!(ComicStatus::Failed.is_terminal());
        assert!(!ComicStatus::Scripting.is_terminal());
    }

    #[test]
    fn test_apply_bumps_version_and_keeps_untouched_fields() {
        let mut comic = sample();
        comic.apply(ComicPatch::summary("key ideas"), Utc::now());
        comic.apply(ComicPatch::status(ComicStatus::Scripting), Utc::now());

        assert_eq!(comic.version, 3);
        assert_eq!(comic.status, ComicStatus::Scripting);
        assert_eq!(comic.academic_summary.as_deref(), Some("key ideas"));
    }

    #[test]
    fn test_restart_clears_previous_error() {
        let mut comic = sample();
        comic.apply(ComicPatch::failed("boom"), Utc::now());
        assert_eq!(comic.error_message.as_deref(), Some("boom"));

        comic.apply(ComicPatch::restart(ComicStatus::Extracting), Utc::now());
        assert_eq!(comic.error_message, None);
        assert_eq!(comic.status, ComicStatus::Extracting);
    }

    #[test]
    fn test_cleared_error_is_written_as_null() {
        let mut comic = sample();
        comic.apply(ComicPatch::failed("boom"), Utc::now());
        comic.apply(ComicPatch::restart(ComicStatus::Extracting), Utc::now());

        let value = serde_json::to_value(&comic).unwrap();
        assert_eq!(value.get("error_message"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn test_missing_version_defaults_to_one() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("version");
        let comic: Comic = serde_json::from_value(value).unwrap();
        assert_eq!(comic.version, 1);
    }
}
