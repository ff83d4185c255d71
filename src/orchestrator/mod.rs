//! 编排层
//!
//! - `intake` - 新建漫画（校验、上传、创建记录）
//! - `batch_processor` - 批量生成待处理的漫画
//! - `app` - 应用主结构，组装各层能力

pub mod app;
pub mod batch_processor;
pub mod intake;

pub use app::App;
pub use batch_processor::{BatchProcessor, BatchSummary};
pub use intake::{submit, ComicParams};
