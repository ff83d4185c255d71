//! 漫画书架

use crate::models::comic::{Comic, ComicStatus};

/// 书架上点击一本漫画时的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryAction {
    /// 打开阅读
    View,
    /// 失败的漫画暂不提供重试
    None,
    /// 回到生成流程
    ResumeGeneration,
}

impl LibraryAction {
    /// 对应的命令行提示
    pub fn command_hint(self, id: &str) -> Option<String> {
        match self {
            LibraryAction::View => Some(format!("comic-forge show {}", id)),
            LibraryAction::ResumeGeneration => Some(format!("comic-forge generate {}", id)),
            LibraryAction::None => None,
        }
    }
}

/// 状态角标
pub fn badge(status: ComicStatus) -> &'static str {
    match status {
        ComicStatus::Completed => "✓ Complete",
        ComicStatus::Failed => "✗ Failed",
        _ => "⟳ Processing",
    }
}

pub fn action(status: ComicStatus) -> LibraryAction {
    match status {
        ComicStatus::Completed => LibraryAction::View,
        ComicStatus::Failed => LibraryAction::None,
        _ => LibraryAction::ResumeGeneration,
    }
}

/// 按创建时间倒序排列
pub fn sort_for_library(comics: &mut [Comic]) {
    comics.sort_by(|a, b| b.created_date.cmp(&a.created_date));
}

/// 书架中的一行
pub fn library_line(comic: &Comic) -> String {
    let mut line = format!(
        "{:<14} {}  《{}》 {} · {} · {} pages · {}",
        badge(comic.status),
        comic.id,
        comic.title,
        comic.topic,
        comic.humor_style.label(),
        comic.page_count,
        comic.created_date.format("%b %-d")
    );
    if let Some(hint) = action(comic.status).command_hint(&comic.id) {
        line.push_str(&format!("  → {}", hint));
    }
    if comic.status == ComicStatus::Failed {
        if let Some(message) = comic.error_message.as_deref() {
            line.push_str(&format!("\n{:<14} {}", "", message));
        }
    }
    line
}

/// 渲染整个书架
pub fn render_library(comics: &[Comic]) -> String {
    if comics.is_empty() {
        return "No comics yet".to_string();
    }

    let mut sorted = comics.to_vec();
    sort_for_library(&mut sorted);
    sorted.iter().map(library_line).collect::<Vec<_>>().join("\n")
}
