use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 应用统一错误类型
///
/// 所有错误对单次请求都是终态：不存在内部重试。远端错误保留上游
/// 状态码与原始 message，由各端点的响应包装器决定落到哪种 JSON 外形。
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 参数校验错误（缺少 image/type、无上传文件等）
    #[error("参数校验错误: {0}")]
    Validation(String),

    /// 上传内容超过大小上限
    #[error("文件过大: {0}")]
    PayloadTooLarge(String),

    /// 方法不被允许（仅 POST/OPTIONS）
    #[error("方法不被允许: {0}")]
    MethodNotAllowed(String),

    /// 服务端配置缺失（如未配置 token；message 不得泄露机密值）
    #[error("服务配置错误: {0}")]
    Configuration(String),

    /// multipart 流解码失败
    #[error("表单解码错误: {0}")]
    Decode(String),

    /// 内容仓库服务返回非 2xx（状态码与 message 原样透传）
    #[error("内容仓库错误 [{status}]: {message}")]
    Remote {
        /// 上游状态码（无法确定时为 500）
        status: u16,
        /// 上游返回的原始 message
        message: String,
    },

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl AppError {
    /// 映射到 HTTP 状态码；Remote 透传上游状态码，非法值回退 500。
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Remote { status, .. } => StatusCode::from_u16(*status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 面向调用方的 message（Remote 为上游原文，其余为变体内文案）。
    pub fn client_message(&self) -> &str {
        match self {
            AppError::Validation(m)
            | AppError::PayloadTooLarge(m)
            | AppError::MethodNotAllowed(m)
            | AppError::Configuration(m)
            | AppError::Decode(m)
            | AppError::Internal(m) => m,
            AppError::Remote { message, .. } => message,
        }
    }
}

/// JSON 端点的错误外形：`{ "error": string, "details"?: string }`
///
/// 远端失败时 error 固定为 "Upload failed"，上游 message 放入 details。
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct JsonErrorBody {
    /// 错误说明
    pub error: String,
    /// 远端失败时的上游 message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// 将 [`AppError`] 落为 JSON 端点错误响应的包装器
#[derive(Debug)]
pub struct JsonApiError(pub AppError);

impl From<AppError> for JsonApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = match &self.0 {
            AppError::Remote { message, .. } => JsonErrorBody {
                error: "Upload failed".to_string(),
                details: Some(message.clone()),
            },
            other => JsonErrorBody {
                error: other.client_message().to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// 表单端点的错误外形：`{ "success": false, "message": string }`
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct FormErrorBody {
    /// 恒为 false
    pub success: bool,
    /// 错误说明（远端失败时为上游 message 原文）
    pub message: String,
}

/// 将 [`AppError`] 落为表单端点错误响应的包装器
#[derive(Debug)]
pub struct FormApiError(pub AppError);

impl From<AppError> for FormApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for FormApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let body = FormErrorBody {
            success: false,
            message: self.0.client_message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, FormApiError, JsonApiError};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("parse json")
    }

    #[tokio::test]
    async fn json_wrapper_puts_remote_message_in_details() {
        let resp = JsonApiError(AppError::Remote {
            status: 404,
            message: "Not Found".to_string(),
        })
        .into_response();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let v = body_json(resp).await;
        assert_eq!(v["error"], "Upload failed");
        assert_eq!(v["details"], "Not Found");
    }

    #[tokio::test]
    async fn form_wrapper_propagates_remote_status_and_message_verbatim() {
        let resp = FormApiError(AppError::Remote {
            status: 404,
            message: "Not Found".to_string(),
        })
        .into_response();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let v = body_json(resp).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["message"], "Not Found");
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_error_field() {
        let resp =
            JsonApiError(AppError::Validation("Missing image data or type.".into()))
                .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let v = body_json(resp).await;
        assert_eq!(v["error"], "Missing image data or type.");
        assert!(v.get("details").is_none());
    }

    #[test]
    fn remote_invalid_status_falls_back_to_500() {
        let err = AppError::Remote {
            status: 42,
            message: "weird".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
