//! # Academic Comics
//!
//! 把上传的学习资料变成带幽默风格的教育漫画
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构，上层只依赖下层：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 对外部协作方的薄封装，只负责收发
//! - `LlmClient` - OpenAI 兼容的对话接口
//! - `ImageClient` - 图片生成接口
//! - `StoreClient` / `FileClient` - 远程实体存储和文件上传下载
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `ComicStore` - 漫画记录的增删改查（内存 / 本地 JSON / 远程）
//! - `FileStorage` - 文件上传
//! - `GenerationProvider` - 内容提取、文本、结构化和图片生成
//! - `AssetDownloader` - 批量下载已完成漫画的图片
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一本漫画"的完整生成流程
//! - `state_machine` - 纯函数状态机
//! - `ComicFlow` - 流程编排（提取 → 摘要 → 脚本 → 插图 → 完成）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/intake` - 新建漫画
//! - `orchestrator/batch_processor` - 批量生成待处理漫画
//! - `App` - 按配置组装各层
//!
//! ### ⑤ 展示层（Viewer）
//! - `viewer/` - 书架列表和分页阅读

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod viewer;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Comic, ComicStatus, HumorStyle};
pub use orchestrator::{App, ComicParams};
pub use workflow::{ComicFlow, ProgressStep};
