//! 程序配置
//!
//! 优先级：环境变量 > TOML 配置文件 > 默认值

use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// 实体存储后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// 本地 JSON 文件
    Local,
    /// 远程托管平台
    Remote,
}

impl std::str::FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StoreBackend::Local),
            "remote" => Ok(StoreBackend::Remote),
            other => Err(AppError::config(format!("未知的存储后端: {}", other))),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 本地数据目录（本地存储和上传文件都放在这里）
    pub data_dir: String,
    /// 实体存储后端
    pub store_backend: StoreBackend,
    /// 远程平台地址
    pub store_base_url: String,
    pub store_api_key: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- 图片生成配置 ---
    pub image_api_base_url: String,
    pub image_api_key: String,
    pub image_model_name: String,
    pub image_size: String,
    /// 批量模式下同时生成的漫画数量
    pub max_concurrent_comics: usize,
    /// 批量下载时每张图片之间的间隔（毫秒）
    pub download_delay_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "comic_data".to_string(),
            store_backend: StoreBackend::Local,
            store_base_url: String::new(),
            store_api_key: String::new(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.7,
            llm_max_tokens: 4096,
            image_api_base_url: "https://api.openai.com/v1".to_string(),
            image_api_key: String::new(),
            image_model_name: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            max_concurrent_comics: 4,
            download_delay_ms: 500,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从默认值 + 环境变量构建配置
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 加载配置文件（可选）并应用环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| AppError::io(path.display().to_string(), e))?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    /// 解析 TOML 文本，缺失字段使用默认值
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    fn with_env_overrides(self) -> AppResult<Self> {
        let mut config = self;

        if let Some(v) = env_var("COMIC_DATA_DIR") {
            config.data_dir = v;
        }
        if let Some(v) = env_var("STORE_BACKEND") {
            config.store_backend = v.parse()?;
        }
        if let Some(v) = env_var("STORE_BASE_URL") {
            config.store_base_url = v;
        }
        if let Some(v) = env_var("STORE_API_KEY") {
            config.store_api_key = v;
        }
        if let Some(v) = env_var("LLM_API_KEY") {
            config.llm_api_key = v;
        }
        if let Some(v) = env_var("LLM_API_BASE_URL") {
            config.llm_api_base_url = v;
        }
        if let Some(v) = env_var("LLM_MODEL_NAME") {
            config.llm_model_name = v;
        }
        config.llm_temperature = parse_env("LLM_TEMPERATURE", config.llm_temperature)?;
        config.llm_max_tokens = parse_env("LLM_MAX_TOKENS", config.llm_max_tokens)?;
        if let Some(v) = env_var("IMAGE_API_BASE_URL") {
            config.image_api_base_url = v;
        }
        if let Some(v) = env_var("IMAGE_API_KEY") {
            config.image_api_key = v;
        }
        if let Some(v) = env_var("IMAGE_MODEL_NAME") {
            config.image_model_name = v;
        }
        if let Some(v) = env_var("IMAGE_SIZE") {
            config.image_size = v;
        }
        config.max_concurrent_comics =
            parse_env("COMIC_MAX_CONCURRENT", config.max_concurrent_comics)?;
        config.download_delay_ms = parse_env("COMIC_DOWNLOAD_DELAY_MS", config.download_delay_ms)?;
        config.verbose_logging = parse_env("VERBOSE_LOGGING", config.verbose_logging)?;

        if config.max_concurrent_comics == 0 {
            return Err(AppError::config("max_concurrent_comics 必须大于 0"));
        }

        Ok(config)
    }

    /// 图片接口的密钥，未单独配置时沿用 LLM 密钥
    pub fn effective_image_api_key(&self) -> &str {
        if self.image_api_key.is_empty() {
            &self.llm_api_key
        } else {
            &self.image_api_key
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env_var(name) {
        Some(value) => value.trim().parse().map_err(|_| {
            AppError::config(format!(
                "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                name,
                value,
                std::any::type_name::<T>()
            ))
        }),
        None => Ok(default),
    }
}
