//! 漫画阅读分页
//!
//! 下标 0 是封面，1..=N 依次是脚本第 1..N 页；翻页在两端停住，不循环

use crate::error::{AppError, AppResult};
use crate::models::comic::Comic;
use crate::models::humor::HumorStyle;
use crate::models::script::Page;

/// 当前显示的内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PagerView<'a> {
    Cover {
        title: &'a str,
        topic: &'a str,
        humor_style: HumorStyle,
        cover_image_url: Option<&'a str>,
    },
    Page(&'a Page),
}

#[derive(Debug, Clone)]
pub struct Pager<'a> {
    comic: &'a Comic,
    index: usize,
}

impl<'a> Pager<'a> {
    /// 只有已完成的漫画可以阅读
    pub fn open(comic: &'a Comic) -> AppResult<Self> {
        if !comic.is_readable() {
            return Err(AppError::validation(format!(
                "漫画 {} 尚未完成 (状态: {})",
                comic.id, comic.status
            )));
        }
        Ok(Self { comic, index: 0 })
    }

    /// 脚本页数（不含封面）
    pub fn len(&self) -> usize {
        self.comic.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comic.script.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next_page(&mut self) {
        if self.index < self.len() {
            self.index += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// 跳到指定下标，超出范围时停在最后一页
    pub fn go_to(&mut self, index: usize) {
        self.index = index.min(self.len());
    }

    pub fn current(&self) -> PagerView<'a> {
        match self.index {
            0 => PagerView::Cover {
                title: &self.comic.title,
                topic: &self.comic.topic,
                humor_style: self.comic.humor_style,
                cover_image_url: self.comic.cover_image_url.as_deref(),
            },
            i => PagerView::Page(&self.comic.script[i - 1]),
        }
    }

    pub fn position_label(&self) -> String {
        format!("Page {} of {}", self.index + 1, self.len() + 1)
    }

    /// 以纯文本渲染当前内容
    pub fn render(&self) -> String {
        let mut lines = Vec::new();

        match self.current() {
            PagerView::Cover {
                title,
                topic,
                humor_style,
                cover_image_url,
            } => {
                lines.push(format!("# {}", title));
                lines.push(format!("{} · {}", topic, humor_style.label()));
                if let Some(url) = cover_image_url {
                    lines.push(format!("[cover] {}", url));
                }
            }
            PagerView::Page(page) => {
                lines.push(format!("## Page {}", page.page_number));
                for panel in &page.panels {
                    lines.push(format!("[panel {}] {}", panel.panel_number, panel.image_url));
                    lines.push(format!("  {}", panel.scene_description));
                    if let Some(dialogue) = panel.dialogue.as_deref().filter(|d| !d.is_empty()) {
                        lines.push(format!("  \u{201c}{}\u{201d}", dialogue));
                    }
                }
            }
        }

        lines.push(self.position_label());
        lines.join("\n")
    }
}
