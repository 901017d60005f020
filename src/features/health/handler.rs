use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// 服务状态
    #[schema(example = "healthy")]
    pub status: String,
    /// 服务名称
    #[schema(example = "imgbed-backend")]
    pub service: String,
    /// 当前版本（Cargo package version）
    #[schema(example = "0.1.0")]
    pub version: String,
    /// 上传通道是否就绪（token 与目标仓库已配置齐全）
    #[schema(example = true)]
    pub uploader_ready: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "探活端点：返回服务状态、版本与上传配置就绪情况。\
        uploader_ready 为 false 表示 token 或目标仓库缺失，上传请求会返回配置错误。",
    responses((status = 200, description = "服务健康", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let github = &state.config.github;
    let uploader_ready =
        !github.token.trim().is_empty() && !github.owner.is_empty() && !github.repo.is_empty();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            service: "imgbed-backend".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uploader_ready,
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::extract::State;

    use crate::config::AppConfig;
    use crate::error::AppError;
    use crate::features::upload::store::{ContentStore, StoredContent};
    use crate::state::AppState;

    use super::health_check;

    struct NoopStore;

    #[async_trait]
    impl ContentStore for NoopStore {
        async fn put(
            &self,
            _path: &str,
            _content_base64: &str,
            _commit_message: &str,
        ) -> Result<StoredContent, AppError> {
            Ok(StoredContent { sha: String::new() })
        }
    }

    fn state_with(config: AppConfig) -> AppState {
        AppState {
            config: Arc::new(config),
            content_store: Arc::new(NoopStore),
        }
    }

    #[tokio::test]
    async fn reports_ready_when_github_config_is_complete() {
        let mut cfg = AppConfig::default();
        cfg.github.token = "tok".to_string();
        cfg.github.owner = "octocat".to_string();
        cfg.github.repo = "octocat.github.io".to_string();

        let (status, body) = health_check(State(state_with(cfg))).await;
        assert_eq!(status, axum::http::StatusCode::OK);
        assert_eq!(body.status, "healthy");
        assert!(body.uploader_ready);
    }

    #[tokio::test]
    async fn reports_not_ready_when_token_is_blank() {
        let mut cfg = AppConfig::default();
        cfg.github.token = "   ".to_string();
        cfg.github.owner = "octocat".to_string();
        cfg.github.repo = "octocat.github.io".to_string();

        let (status, body) = health_check(State(state_with(cfg))).await;
        // 探活仍然是 200：就绪状态只作为字段透出，不影响存活判定
        assert_eq!(status, axum::http::StatusCode::OK);
        assert!(!body.uploader_ready);
    }
}
