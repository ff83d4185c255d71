//! 实体存储 - 业务能力层
//!
//! 只负责 Comic 记录的 create / get / update / list，不关心流程
//!
//! 所有 `update` 都必须带上调用方读到的版本号，版本不一致时返回
//! `AppError::StaleWrite`，写入被拒绝

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::clients::StoreClient;
use crate::error::{AppError, AppResult};
use crate::models::comic::{Comic, ComicPatch, ComicStatus, NewComic};
use crate::models::loaders::{load_all_comic_files, load_comic_file, save_comic_file};

/// 漫画记录存储
#[async_trait]
pub trait ComicStore: Send + Sync {
    /// 新建记录，返回带 ID 的完整记录
    async fn create(&self, new: NewComic) -> AppResult<Comic>;

    /// 读取记录，不存在时返回 `NotFound`
    async fn get(&self, id: &str) -> AppResult<Comic>;

    /// 部分更新，`expected_version` 必须等于当前版本
    async fn update(&self, id: &str, expected_version: u64, patch: ComicPatch) -> AppResult<Comic>;

    /// 按创建时间倒序列出全部记录
    async fn list(&self) -> AppResult<Vec<Comic>>;
}

fn check_version(comic: &Comic, expected_version: u64) -> AppResult<()> {
    if comic.version != expected_version {
        return Err(AppError::StaleWrite {
            id: comic.id.clone(),
            expected: expected_version,
            actual: comic.version,
        });
    }
    Ok(())
}

fn sort_newest_first(comics: &mut [Comic]) {
    comics.sort_by(|a, b| b.created_date.cmp(&a.created_date));
}

// ========== 内存存储 ==========

#[derive(Default)]
struct MemoryState {
    comics: HashMap<String, Comic>,
    /// 每条记录写过的状态，按写入顺序
    status_history: HashMap<String, Vec<ComicStatus>>,
}

/// 内存存储（测试和一次性运行使用）
#[derive(Default)]
pub struct MemoryComicStore {
    state: Mutex<MemoryState>,
}

impl MemoryComicStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某条记录依次写入过的状态（含创建时的初始状态）
    pub async fn status_history(&self, id: &str) -> Vec<ComicStatus> {
        self.state
            .lock()
            .await
            .status_history
            .get(id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ComicStore for MemoryComicStore {
    async fn create(&self, new: NewComic) -> AppResult<Comic> {
        let comic = Comic::from_new(Uuid::new_v4().to_string(), new, Utc::now());

        let mut state = self.state.lock().await;
        state
            .status_history
            .insert(comic.id.clone(), vec![comic.status]);
        state.comics.insert(comic.id.clone(), comic.clone());

        Ok(comic)
    }

    async fn get(&self, id: &str) -> AppResult<Comic> {
        self.state
            .lock()
            .await
            .comics
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound { id: id.to_string() })
    }

    async fn update(&self, id: &str, expected_version: u64, patch: ComicPatch) -> AppResult<Comic> {
        let mut state = self.state.lock().await;

        let new_status = patch.status;
        let comic = state
            .comics
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound { id: id.to_string() })?;

        check_version(comic, expected_version)?;
        comic.apply(patch, Utc::now());
        let updated = comic.clone();

        if let Some(status) = new_status {
            state
                .status_history
                .entry(id.to_string())
                .or_default()
                .push(status);
        }

        Ok(updated)
    }

    async fn list(&self) -> AppResult<Vec<Comic>> {
        let mut comics: Vec<Comic> = self.state.lock().await.comics.values().cloned().collect();
        sort_newest_first(&mut comics);
        Ok(comics)
    }
}

// ========== 本地文件存储 ==========

/// 本地 JSON 文件存储，每条记录一个 `<id>.json`
pub struct FileComicStore {
    folder: PathBuf,
    /// 串行化写入，保证版本检查 + 写文件是原子的
    write_lock: Mutex<()>,
}

impl FileComicStore {
    /// 在 `folder` 下存储记录，目录不存在时自动创建
    pub async fn open(folder: impl Into<PathBuf>) -> AppResult<Self> {
        let folder = folder.into();
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|e| AppError::io(folder.display().to_string(), e))?;

        Ok(Self {
            folder,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, id: &str) -> AppResult<PathBuf> {
        // ID 直接拼进路径，只允许安全字符
        if id.is_empty()
            || !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::NotFound { id: id.to_string() });
        }
        Ok(self.folder.join(format!("{}.json", id)))
    }

    async fn read(&self, id: &str) -> AppResult<Comic> {
        let path = self.path_for(id)?;
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::io(path.display().to_string(), e))?;
        if !exists {
            return Err(AppError::NotFound { id: id.to_string() });
        }
        load_comic_file(&path).await
    }
}

#[async_trait]
impl ComicStore for FileComicStore {
    async fn create(&self, new: NewComic) -> AppResult<Comic> {
        let comic = Comic::from_new(Uuid::new_v4().to_string(), new, Utc::now());

        let _guard = self.write_lock.lock().await;
        save_comic_file(&self.path_for(&comic.id)?, &comic).await?;
        debug!("已创建本地记录 {}", comic.id);

        Ok(comic)
    }

    async fn get(&self, id: &str) -> AppResult<Comic> {
        self.read(id).await
    }

    async fn update(&self, id: &str, expected_version: u64, patch: ComicPatch) -> AppResult<Comic> {
        let _guard = self.write_lock.lock().await;

        let mut comic = self.read(id).await?;
        check_version(&comic, expected_version)?;
        comic.apply(patch, Utc::now());
        save_comic_file(&self.path_for(id)?, &comic).await?;

        Ok(comic)
    }

    async fn list(&self) -> AppResult<Vec<Comic>> {
        let mut comics = load_all_comic_files(&self.folder).await?;
        sort_newest_first(&mut comics);
        Ok(comics)
    }
}

// ========== 远程存储 ==========

/// 远程托管平台存储
///
/// 平台没有条件写接口，版本检查是"先读、比较、再写"，
/// 两次请求之间仍可能被其他写入方插入
pub struct RemoteComicStore {
    client: StoreClient,
}

impl RemoteComicStore {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }
}

/// 远程更新的请求体：只带补丁里出现的字段，外加新的版本号和更新时间
///
/// `error_message: Some(None)` 会写成 null，平台按字段合并时才能真正清空
fn update_body(patch: &ComicPatch, next_version: u64, now: DateTime<Utc>) -> AppResult<JsonValue> {
    let mut body = serde_json::to_value(patch)?;
    if let Some(fields) = body.as_object_mut() {
        fields.insert("version".to_string(), JsonValue::from(next_version));
        fields.insert("updated_date".to_string(), serde_json::to_value(now)?);
    }
    Ok(body)
}

#[async_trait]
impl ComicStore for RemoteComicStore {
    async fn create(&self, new: NewComic) -> AppResult<Comic> {
        self.client.create(&new).await
    }

    async fn get(&self, id: &str) -> AppResult<Comic> {
        self.client
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound { id: id.to_string() })
    }

    async fn update(&self, id: &str, expected_version: u64, patch: ComicPatch) -> AppResult<Comic> {
        let comic = self.get(id).await?;
        check_version(&comic, expected_version)?;
        let body = update_body(&patch, comic.version + 1, Utc::now())?;
        self.client.put(id, &body).await
    }

    async fn list(&self) -> AppResult<Vec<Comic>> {
        let mut comics = self.client.list().await?;
        sort_newest_first(&mut comics);
        Ok(comics)
    }
}
