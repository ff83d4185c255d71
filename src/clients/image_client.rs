//! 图片生成 API 客户端
//!
//! 调用兼容 OpenAI 的 `POST /images/generations` 接口，只取返回的图片 URL

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::clients::http::{parse_response, request_failed};
use crate::config::Config;
use crate::error::{AppError, AppResult, RemoteOperation};

/// 图片生成客户端
pub struct ImageClient {
    client: reqwest::Client,
    api_base_url: String,
    api_key: String,
    model_name: String,
    size: String,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

impl ImageClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let api_key = config.effective_image_api_key();
        if api_key.is_empty() {
            return Err(AppError::config("缺少 IMAGE_API_KEY / LLM_API_KEY"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_base_url: config.image_api_base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model_name: config.image_model_name.clone(),
            size: config.image_size.clone(),
        })
    }

    /// 生成一张图片
    ///
    /// # 返回
    /// 返回图片的公开 URL
    pub async fn generate(&self, prompt: &str) -> AppResult<String> {
        const OP: RemoteOperation = RemoteOperation::ImageGeneration;

        debug!("调用图片生成 API，模型: {}", self.model_name);

        let body = json!({
            "model": self.model_name,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
        });

        let response = self
            .client
            .post(format!("{}/images/generations", self.api_base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(request_failed(OP))?;

        let images: ImagesResponse = parse_response(response, OP).await?;

        images
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| AppError::remote(OP, "图片生成返回结果为空"))
    }
}
