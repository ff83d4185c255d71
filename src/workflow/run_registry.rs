//! 进程内的生成任务登记表
//!
//! 同一个漫画 ID 同时只允许一个生成任务，第二个直接返回 `AlreadyRunning`

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{AppError, AppResult};

#[derive(Clone, Default)]
pub struct RunRegistry {
    running: Arc<Mutex<HashSet<String>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个任务，返回的守卫在 drop 时自动注销
    pub fn acquire(&self, id: &str) -> AppResult<RunGuard> {
        let mut running = self.lock();
        if !running.insert(id.to_string()) {
            return Err(AppError::AlreadyRunning { id: id.to_string() });
        }
        Ok(RunGuard {
            registry: self.clone(),
            id: id.to_string(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // 集合里只有 ID，持锁线程 panic 后内容依然可用
        self.running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 生成任务守卫
pub struct RunGuard {
    registry: RunRegistry,
    id: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.id);
    }
}
