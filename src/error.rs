use std::fmt;

use thiserror::Error;

/// 远程操作类型
///
/// 用于标记是哪一个外部协作方出了问题
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOperation {
    /// 实体存储（Comic 记录的增删改查）
    EntityStore,
    /// 文档内容提取
    ContentExtraction,
    /// 普通文本生成
    TextGeneration,
    /// 结构化文本生成
    StructuredGeneration,
    /// 图片生成
    ImageGeneration,
    /// 文件上传
    FileUpload,
    /// 素材下载
    AssetDownload,
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteOperation::EntityStore => "实体存储",
            RemoteOperation::ContentExtraction => "内容提取",
            RemoteOperation::TextGeneration => "文本生成",
            RemoteOperation::StructuredGeneration => "结构化生成",
            RemoteOperation::ImageGeneration => "图片生成",
            RemoteOperation::FileUpload => "文件上传",
            RemoteOperation::AssetDownload => "素材下载",
        };
        f.write_str(name)
    }
}

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 漫画记录不存在
    #[error("漫画不存在: {id}")]
    NotFound { id: String },

    /// 远程操作失败
    ///
    /// 只显示远程返回的原始消息，失败的生成任务会把它原样写进 error_message
    #[error("{message}")]
    RemoteOperationFailure {
        operation: RemoteOperation,
        message: String,
    },

    /// 数据校验失败（结构化输出格式不对、参数非法等）
    #[error("校验失败: {reason}")]
    ValidationFailure { reason: String },

    /// 状态机拒绝的状态转移
    #[error("非法状态转移: {from} 不接受事件 {event}")]
    InvalidTransition { from: String, event: String },

    /// 乐观锁冲突：记录已被其他写入方修改
    #[error("漫画 {id} 写入冲突: 期望版本 {expected}, 实际版本 {actual}")]
    StaleWrite {
        id: String,
        expected: u64,
        actual: u64,
    },

    /// 同一个漫画已经有生成任务在运行
    #[error("漫画 {id} 已有生成任务在运行")]
    AlreadyRunning { id: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config { message: String },

    /// 文件读写错误
    #[error("文件操作失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建远程操作失败错误
    pub fn remote(operation: RemoteOperation, message: impl Into<String>) -> Self {
        AppError::RemoteOperationFailure {
            operation,
            message: message.into(),
        }
    }

    /// 创建校验失败错误
    pub fn validation(reason: impl Into<String>) -> Self {
        AppError::ValidationFailure {
            reason: reason.into(),
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config {
            message: message.into(),
        }
    }

    /// 创建文件读写错误
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// 是否为乐观锁冲突
    pub fn is_stale_write(&self) -> bool {
        matches!(self, AppError::StaleWrite { .. })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::config(format!("TOML解析失败: {}", err))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
