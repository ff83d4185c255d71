//! 命令行参数

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::comic::DEFAULT_PAGE_COUNT;
use crate::models::humor::HumorStyle;
use crate::orchestrator::ComicParams;

#[derive(Debug, Parser)]
#[command(name = "comic-forge", version, about = "把学习资料变成幽默的教育漫画")]
pub struct Cli {
    /// TOML 配置文件
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// 显示 debug 日志
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// 上传资料并新建一本漫画
    Create {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(short, long)]
        title: String,
        #[arg(short = 'p', long)]
        topic: String,
        /// witty / meme / bollywood / puns / sarcastic
        #[arg(long, default_value = "witty")]
        humor: HumorStyle,
        #[arg(long, default_value_t = DEFAULT_PAGE_COUNT)]
        pages: u32,
        /// 创建后立即生成
        #[arg(short, long)]
        generate: bool,
    },
    /// 生成（或重新生成）指定漫画
    Generate { id: String },
    /// 生成所有 status = uploading 的漫画
    ProcessPending,
    /// 列出书架
    List,
    /// 阅读漫画，`--page 0` 是封面
    Show {
        id: String,
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// 下载封面和全部面板图片
    Download {
        id: String,
        #[arg(short, long)]
        out: PathBuf,
    },
}

impl Commands {
    /// `create` 子命令的漫画参数
    pub fn comic_params(&self) -> Option<ComicParams> {
        match self {
            Commands::Create {
                title,
                topic,
                humor,
                pages,
                ..
            } => Some(ComicParams {
                title: title.clone(),
                topic: topic.clone(),
                humor_style: *humor,
                page_count: *pages,
            }),
            _ => None,
        }
    }
}
