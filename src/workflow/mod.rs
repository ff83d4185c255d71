//! 流程层
//!
//! 定义"一本漫画"从上传到完成的生成流程

pub mod comic_ctx;
pub mod comic_flow;
pub mod prompts;
pub mod run_registry;
pub mod state_machine;

pub use comic_ctx::ComicCtx;
pub use comic_flow::{ComicFlow, ProgressUpdate};
pub use run_registry::RunRegistry;
pub use state_machine::{transition, Command, Event, ProgressStep};
