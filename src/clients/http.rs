//! reqwest 响应处理的公共辅助函数

use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult, RemoteOperation};

/// 确认响应状态码为 2xx，否则把状态码和响应体包装成远程错误
pub async fn ensure_success(
    response: reqwest::Response,
    operation: RemoteOperation,
) -> AppResult<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(AppError::remote(
            operation,
            format!("HTTP {}: {}", status.as_u16(), body),
        ));
    }
    Ok(response)
}

/// 解析成功响应的 JSON
pub async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: RemoteOperation,
) -> AppResult<T> {
    let response = ensure_success(response, operation).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| AppError::remote(operation, format!("响应解析失败: {}", e)))
}

/// 把 reqwest 的传输错误转换为远程错误
pub fn request_failed(operation: RemoteOperation) -> impl FnOnce(reqwest::Error) -> AppError {
    move |e| AppError::remote(operation, e.to_string())
}
