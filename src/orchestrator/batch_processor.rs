//! 批量漫画生成 - 编排层
//!
//! ## 职责
//!
//! 找出所有 status = uploading 的漫画，并发地逐个执行生成流程。
//!
//! - 使用 Semaphore 限制同时生成的漫画数量
//! - 单本漫画内部的各阶段仍然严格串行
//! - 不处理单本漫画的细节，全部委托给 `ComicFlow`

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::comic::ComicStatus;
use crate::services::ComicStore;
use crate::utils::logging::{log_comics_loaded, print_final_stats};
use crate::workflow::ComicFlow;

/// 批量处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// 已有任务在运行或记录被其他写入方接管
    pub skipped: usize,
}

/// 单本漫画的处理结果
enum Outcome {
    Success,
    Failed,
    Skipped,
}

pub struct BatchProcessor {
    store: Arc<dyn ComicStore>,
    flow: Arc<ComicFlow>,
    max_concurrent: usize,
}

impl BatchProcessor {
    pub fn new(store: Arc<dyn ComicStore>, flow: Arc<ComicFlow>, max_concurrent: usize) -> Self {
        Self {
            store,
            flow,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// 生成所有待处理的漫画
    pub async fn process_pending(&self) -> AppResult<BatchSummary> {
        info!("\n📁 正在扫描待生成的漫画...");
        let pending: Vec<String> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|comic| comic.status == ComicStatus::Uploading)
            .map(|comic| comic.id)
            .collect();

        if pending.is_empty() {
            warn!("⚠️ 没有找到待生成的漫画");
            return Ok(BatchSummary::default());
        }

        log_comics_loaded(pending.len(), self.max_concurrent);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(pending.len());

        for id in pending.iter().cloned() {
            let semaphore = semaphore.clone();
            let flow = self.flow.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::config(format!("并发控制已关闭: {}", e)))?;
                flow.run(&id).await
            }));
        }

        let mut summary = BatchSummary {
            total: pending.len(),
            ..Default::default()
        };

        for (id, joined) in pending.iter().zip(join_all(handles).await) {
            let outcome = match joined {
                Ok(Ok(_)) => Outcome::Success,
                Ok(Err(AppError::AlreadyRunning { .. })) | Ok(Err(AppError::StaleWrite { .. })) => {
                    warn!("[漫画 {}] ⏭️ 跳过", id);
                    Outcome::Skipped
                }
                Ok(Err(e)) => {
                    error!("[漫画 {}] ❌ 处理过程中发生错误: {}", id, e);
                    Outcome::Failed
                }
                Err(e) => {
                    error!("[漫画 {}] 任务执行失败: {}", id, e);
                    Outcome::Failed
                }
            };

            match outcome {
                Outcome::Success => summary.success += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Skipped => summary.skipped += 1,
            }
        }

        print_final_stats(summary.success, summary.failed, summary.skipped, summary.total);
        Ok(summary)
    }
}
