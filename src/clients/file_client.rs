//! 文件客户端
//!
//! - 上传：multipart 提交到托管平台，返回文件 URL
//! - 读取：按 URL 拉取内容，支持 `file://` 和 http(s)

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::clients::http::{ensure_success, parse_response, request_failed};
use crate::error::{AppError, AppResult, RemoteOperation};

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file_url: String,
}

/// 文件客户端
#[derive(Clone)]
pub struct FileClient {
    client: reqwest::Client,
}

impl FileClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// 上传本地文件
    ///
    /// # 参数
    /// - `upload_url`: 上传接口完整地址
    /// - `api_key`: 平台密钥（可为空）
    /// - `path`: 本地文件路径
    pub async fn upload(&self, upload_url: &str, api_key: &str, path: &Path) -> AppResult<String> {
        const OP: RemoteOperation = RemoteOperation::FileUpload;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::io(path.display().to_string(), e))?;
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        debug!("上传文件 {} ({} 字节)", file_name, bytes.len());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.client.post(upload_url).multipart(form);
        if !api_key.is_empty() {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(request_failed(OP))?;
        let uploaded: UploadResponse = parse_response(response, OP).await?;

        Ok(uploaded.file_url)
    }

    /// 读取 URL 指向的全部内容
    pub async fn fetch_bytes(&self, url: &str, operation: RemoteOperation) -> AppResult<Vec<u8>> {
        if let Some(path) = url.strip_prefix("file://") {
            return tokio::fs::read(path)
                .await
                .map_err(|e| AppError::remote(operation, format!("读取 {} 失败: {}", path, e)));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(request_failed(operation))?;
        let response = ensure_success(response, operation).await?;

        let bytes = response.bytes().await.map_err(request_failed(operation))?;
        Ok(bytes.to_vec())
    }
}

impl Default for FileClient {
    fn default() -> Self {
        Self::new()
    }
}
