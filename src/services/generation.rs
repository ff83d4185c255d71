//! 生成服务 - 业务能力层
//!
//! 对外只暴露四种远程能力：内容提取、文本生成、结构化生成、图片生成。
//! 提示词怎么写由流程层决定，这里只负责调用和解析
//!
//! ## 技术栈
//! - 文本类操作使用 `async-openai`（兼容 OpenAI API 的服务均可）
//! - 图片使用兼容 OpenAI 的 images 接口

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::clients::{FileClient, ImageClient, LlmClient};
use crate::config::Config;
use crate::error::{AppError, AppResult, RemoteOperation};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid regex"));

/// 内容提取时内联到提示词里的最大字符数
const MAX_INLINE_CHARS: usize = 60_000;

/// 生成服务
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// 从上传的文件中提取学术内容
    async fn extract_content(&self, file_url: &str, topic: &str) -> AppResult<String>;

    /// 普通文本生成
    async fn generate_text(&self, prompt: &str) -> AppResult<String>;

    /// 按 Schema 生成结构化结果
    async fn generate_structured(&self, prompt: &str, schema: &JsonValue) -> AppResult<JsonValue>;

    /// 生成图片，返回图片 URL
    async fn generate_image(&self, prompt: &str) -> AppResult<String>;
}

/// 基于 OpenAI 兼容接口的生成服务
pub struct OpenAiGenerationProvider {
    llm: LlmClient,
    images: ImageClient,
    files: FileClient,
}

impl OpenAiGenerationProvider {
    pub fn new(config: &Config) -> AppResult<Self> {
        let llm = LlmClient::new(config)?;
        debug!("生成服务使用文本模型 {}", llm.model_name());

        Ok(Self {
            llm,
            images: ImageClient::new(config)?,
            files: FileClient::new(),
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiGenerationProvider {
    async fn extract_content(&self, file_url: &str, topic: &str) -> AppResult<String> {
        const OP: RemoteOperation = RemoteOperation::ContentExtraction;

        let bytes = self.files.fetch_bytes(file_url, OP).await?;
        let document = match String::from_utf8(bytes) {
            Ok(text) => DocumentBody::Inline(text),
            Err(_) => {
                warn!("文档不是 UTF-8 文本，按 URL 引用: {}", file_url);
                DocumentBody::Reference(file_url.to_string())
            }
        };

        let prompt = build_extraction_prompt(topic, &document);
        self.llm.chat(&prompt, Some(EXTRACTION_SYSTEM_MESSAGE), OP).await
    }

    async fn generate_text(&self, prompt: &str) -> AppResult<String> {
        self.llm
            .chat(prompt, None, RemoteOperation::TextGeneration)
            .await
    }

    async fn generate_structured(&self, prompt: &str, schema: &JsonValue) -> AppResult<JsonValue> {
        let schema_text = serde_json::to_string_pretty(schema)?;
        let full_prompt = format!(
            "{}\n\nRespond with a single JSON document that validates against this JSON Schema. \
             Do not add any commentary.\n{}",
            prompt, schema_text
        );

        let response = self
            .llm
            .chat(
                &full_prompt,
                Some("You only ever answer with valid JSON."),
                RemoteOperation::StructuredGeneration,
            )
            .await?;

        parse_json_reply(&response)
    }

    async fn generate_image(&self, prompt: &str) -> AppResult<String> {
        self.images.generate(prompt).await
    }
}

const EXTRACTION_SYSTEM_MESSAGE: &str =
    "You are an expert academic content extractor.";

/// 待提取文档
enum DocumentBody {
    /// 文本内容直接放进提示词
    Inline(String),
    /// 二进制文档只能给出 URL
    Reference(String),
}

fn build_extraction_prompt(topic: &str, document: &DocumentBody) -> String {
    let document_section = match document {
        DocumentBody::Inline(text) => {
            let text: String = text.chars().take(MAX_INLINE_CHARS).collect();
            format!("Document content:\n{}", text)
        }
        DocumentBody::Reference(url) => format!("Document URL: {}", url),
    };

    format!(
        r#"Analyze the following document and extract the key academic concepts, theories, facts, and information. Focus on the main educational content that would be valuable for learning.

Topic: {}

Provide a comprehensive summary that captures all important educational points in a clear, structured format.

{}"#,
        topic, document_section
    )
}

/// 解析模型返回的 JSON，兼容 Markdown 代码块包裹
pub fn parse_json_reply(response: &str) -> AppResult<JsonValue> {
    let trimmed = response.trim();

    if let Ok(value) = serde_json::from_str::<JsonValue>(trimmed) {
        return Ok(value);
    }

    // ```json ... ``` 代码块
    if let Some(body) = FENCED_JSON.captures(trimmed).and_then(|c| c.get(1)) {
        if let Ok(value) = serde_json::from_str::<JsonValue>(body.as_str().trim()) {
            return Ok(value);
        }
    }

    // 截取第一个 { 到最后一个 }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<JsonValue>(&trimmed[start..=end]) {
                debug!("从带前后缀的回复中截取到 JSON");
                return Ok(value);
            }
        }
    }

    Err(AppError::validation(format!(
        "结构化生成返回的不是 JSON: {}",
        crate::utils::logging::truncate_text(trimmed, 120)
    )))
}
