//! 应用主结构 - 编排层
//!
//! 根据配置组装存储、文件存储和生成能力，对外提供命令行需要的全部操作

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clients::StoreClient;
use crate::config::{Config, StoreBackend};
use crate::error::AppResult;
use crate::models::comic::Comic;
use crate::orchestrator::batch_processor::{BatchProcessor, BatchSummary};
use crate::orchestrator::intake::{self, ComicParams};
use crate::services::{
    AssetDownloader, ComicStore, DownloadReport, FileComicStore, FileStorage, GenerationProvider,
    LocalFileStorage, OpenAiGenerationProvider, RemoteComicStore, RemoteFileStorage,
};
use crate::utils::logging::log_startup;
use crate::workflow::{ComicFlow, ProgressUpdate, RunRegistry};

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<dyn ComicStore>,
    storage: Arc<dyn FileStorage>,
    registry: RunRegistry,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let data_dir = PathBuf::from(&config.data_dir);
        let store: Arc<dyn ComicStore>;
        let storage: Arc<dyn FileStorage>;
        match config.store_backend {
            StoreBackend::Local => {
                store = Arc::new(FileComicStore::open(data_dir.join("comics")).await?);
                storage = Arc::new(LocalFileStorage::new(data_dir.join("uploads")));
            }
            StoreBackend::Remote => {
                store = Arc::new(RemoteComicStore::new(StoreClient::new(&config)?));
                storage = Arc::new(RemoteFileStorage::new(
                    &config.store_base_url,
                    config.store_api_key.clone(),
                ));
            }
        }

        Ok(Self::with_parts(config, store, storage))
    }

    /// 用现成的存储组装应用
    pub fn with_parts(
        config: Config,
        store: Arc<dyn ComicStore>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            config,
            store,
            storage,
            registry: RunRegistry::new(),
        }
    }

    /// 新建漫画，`generate` 为 true 时紧接着生成
    pub async fn create(&self, params: &ComicParams, file: &Path, generate: bool) -> AppResult<Comic> {
        let comic = intake::submit(self.store.as_ref(), self.storage.as_ref(), params, file).await?;
        if !generate {
            return Ok(comic);
        }
        self.generate(&comic.id).await
    }

    /// 生成单本漫画，进度输出到日志
    pub async fn generate(&self, id: &str) -> AppResult<Comic> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<ProgressUpdate>();
        let reporter = tokio::spawn(async move {
            while let Some(update) = receiver.recv().await {
                info!(
                    "[漫画 {}] ▶ 步骤 {}/5 {} - {}",
                    update.comic_id,
                    update.step.number(),
                    update.step.title(),
                    update.step.description()
                );
            }
        });

        let flow = self.flow()?.with_progress(sender);
        let result = flow.run(id).await;

        // 关闭发送端，等进度日志输出完
        drop(flow);
        if let Err(e) = reporter.await {
            warn!("⚠️ 进度输出任务异常退出: {}", e);
        }

        result
    }

    /// 生成所有待处理的漫画
    pub async fn process_pending(&self) -> AppResult<BatchSummary> {
        let flow = Arc::new(self.flow()?);
        BatchProcessor::new(self.store.clone(), flow, self.config.max_concurrent_comics)
            .process_pending()
            .await
    }

    /// 按创建时间倒序列出全部漫画
    pub async fn list(&self) -> AppResult<Vec<Comic>> {
        self.store.list().await
    }

    pub async fn show(&self, id: &str) -> AppResult<Comic> {
        self.store.get(id).await
    }

    /// 把已完成漫画的全部图片下载到 `out_dir`
    pub async fn download(&self, id: &str, out_dir: &Path) -> AppResult<DownloadReport> {
        let comic = self.store.get(id).await?;
        AssetDownloader::new(Duration::from_millis(self.config.download_delay_ms))
            .download_all(&comic, out_dir)
            .await
    }

    /// 生成能力只在真正需要时创建，列表、查看不要求配置密钥
    fn flow(&self) -> AppResult<ComicFlow> {
        let generator: Arc<dyn GenerationProvider> =
            Arc::new(OpenAiGenerationProvider::new(&self.config)?);
        Ok(self.flow_with(generator))
    }

    /// 使用指定的生成能力组装流程（共享任务登记表）
    pub fn flow_with(&self, generator: Arc<dyn GenerationProvider>) -> ComicFlow {
        ComicFlow::new(self.store.clone(), generator).with_registry(self.registry.clone())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("store_backend", &self.config.store_backend)
            .field("data_dir", &self.config.data_dir)
            .finish()
    }
}
