//! 文件存储 - 业务能力层
//!
//! 只负责"把用户选中的文件变成一个可引用的 URL"

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::clients::FileClient;
use crate::error::{AppError, AppResult};

/// 文件存储
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// 上传文件，返回文件引用 URL
    async fn upload(&self, path: &Path) -> AppResult<String>;
}

/// 本地文件存储
///
/// 把文件复制到 `uploads/<uuid>-<文件名>`，返回 `file://` URL
pub struct LocalFileStorage {
    folder: PathBuf,
}

impl LocalFileStorage {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(&self, path: &Path) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.folder)
            .await
            .map_err(|e| AppError::io(self.folder.display().to_string(), e))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| AppError::validation(format!("无效的文件路径: {}", path.display())))?
            .to_string_lossy()
            .to_string();
        let target = self
            .folder
            .join(format!("{}-{}", Uuid::new_v4().simple(), file_name));

        tokio::fs::copy(path, &target)
            .await
            .map_err(|e| AppError::io(path.display().to_string(), e))?;

        let absolute = tokio::fs::canonicalize(&target)
            .await
            .map_err(|e| AppError::io(target.display().to_string(), e))?;
        info!("📁 文件已保存: {}", absolute.display());

        Ok(format!("file://{}", absolute.display()))
    }
}

/// 远程平台文件存储
pub struct RemoteFileStorage {
    client: FileClient,
    upload_url: String,
    api_key: String,
}

impl RemoteFileStorage {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client: FileClient::new(),
            upload_url: format!("{}/integrations/upload", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl FileStorage for RemoteFileStorage {
    async fn upload(&self, path: &Path) -> AppResult<String> {
        let url = self.client.upload(&self.upload_url, &self.api_key, path).await?;
        info!("📤 文件上传成功: {}", url);
        Ok(url)
    }
}
