//! 远程实体存储客户端
//!
//! 封装托管平台的 REST 接口：
//! - `GET    {base}/entities/Comic/{id}`
//! - `GET    {base}/entities/Comic?sort=-created_date`
//! - `POST   {base}/entities/Comic`
//! - `PUT    {base}/entities/Comic/{id}`（稀疏字段 + 新版本号）

use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::clients::http::{parse_response, request_failed};
use crate::config::Config;
use crate::error::{AppError, AppResult, RemoteOperation};
use crate::models::comic::{Comic, NewComic};

const OP: RemoteOperation = RemoteOperation::EntityStore;

/// 远程实体存储客户端
pub struct StoreClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StoreClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        if config.store_base_url.is_empty() {
            return Err(AppError::config("远程存储需要 STORE_BASE_URL"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.store_base_url.trim_end_matches('/').to_string(),
            api_key: config.store_api_key.clone(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/entities/Comic", self.base_url)
    }

    fn entity_url(&self, id: &str) -> String {
        format!("{}/entities/Comic/{}", self.base_url, id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            request
        } else {
            request.bearer_auth(&self.api_key)
        }
    }

    /// 读取一条记录，不存在时返回 None
    pub async fn get(&self, id: &str) -> AppResult<Option<Comic>> {
        debug!("GET {}", self.entity_url(id));

        let response = self
            .authorize(self.client.get(self.entity_url(id)))
            .send()
            .await
            .map_err(request_failed(OP))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(parse_response(response, OP).await?))
    }

    /// 按创建时间倒序列出所有记录
    pub async fn list(&self) -> AppResult<Vec<Comic>> {
        let response = self
            .authorize(self.client.get(self.collection_url()))
            .query(&[("sort", "-created_date")])
            .send()
            .await
            .map_err(request_failed(OP))?;

        parse_response(response, OP).await
    }

    /// 新建记录，ID 由远程平台分配
    pub async fn create(&self, new: &NewComic) -> AppResult<Comic> {
        let response = self
            .authorize(self.client.post(self.collection_url()))
            .json(new)
            .send()
            .await
            .map_err(request_failed(OP))?;

        parse_response(response, OP).await
    }

    /// 部分更新一条记录，平台按字段合并并返回合并后的记录
    pub async fn put(&self, id: &str, body: &JsonValue) -> AppResult<Comic> {
        debug!("PUT {}", self.entity_url(id));

        let response = self
            .authorize(self.client.put(self.entity_url(id)))
            .json(body)
            .send()
            .await
            .map_err(request_failed(OP))?;

        parse_response(response, OP).await
    }
}
