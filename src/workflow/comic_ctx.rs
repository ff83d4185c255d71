//! 漫画生成上下文
//!
//! 封装"我正在生成哪一本漫画、它最新的记录长什么样"这一信息

use std::fmt::Display;

use crate::models::comic::{Comic, ComicStatus};

/// 单次生成的上下文
///
/// `comic` 始终是最近一次成功写入后的记录，后续写入用它的版本号
#[derive(Debug, Clone)]
pub struct ComicCtx {
    pub comic: Comic,
}

impl ComicCtx {
    pub fn new(comic: Comic) -> Self {
        Self { comic }
    }

    pub fn id(&self) -> &str {
        &self.comic.id
    }

    pub fn status(&self) -> ComicStatus {
        self.comic.status
    }

    pub fn version(&self) -> u64 {
        self.comic.version
    }

    /// 写入成功后替换为存储返回的新记录
    pub fn refresh(&mut self, comic: Comic) {
        self.comic = comic;
    }

    pub fn into_comic(self) -> Comic {
        self.comic
    }
}

impl Display for ComicCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[漫画 {} 《{}》]", self.comic.id, self.comic.title)
    }
}
