use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;

use crate::config::GithubConfig;
use crate::error::AppError;

use super::store::{ContentStore, StoredContent};

/// GitHub Contents API 客户端
///
/// 单一职责：`PUT /repos/{owner}/{repo}/contents/{path}`。非 2xx 一律
/// 映射为 [`AppError::Remote`]，上游状态码与 message 原样透传给调用方。
pub struct GithubContentClient {
    client: reqwest::Client,
    config: GithubConfig,
}

/// Contents API 成功响应中实际消费的部分
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: ContentMeta,
}

#[derive(Debug, Deserialize)]
struct ContentMeta {
    sha: String,
}

impl GithubContentClient {
    pub fn new(config: GithubConfig) -> Result<Self, AppError> {
        let client = crate::http::client_timeout_30s()
            .map_err(|e| AppError::Internal(format!("初始化 HTTP Client 失败: {}", e)))?
            .clone();
        Ok(Self { client, config })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            path
        )
    }
}

#[async_trait]
impl ContentStore for GithubContentClient {
    async fn put(
        &self,
        path: &str,
        content_base64: &str,
        commit_message: &str,
    ) -> Result<StoredContent, AppError> {
        let body = serde_json::json!({
            "message": commit_message,
            "content": content_base64,
            "branch": self.config.branch,
            "committer": {
                "name": self.config.committer_name,
                "email": self.config.committer_email,
            },
        });

        let resp = self
            .client
            .put(self.contents_url(path))
            .bearer_auth(&self.config.token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, "GitHub-Image-Uploader/1.0")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Remote {
                status: 500,
                message: format!("请求内容仓库失败: {}", e),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            // GitHub 错误体形如 {"message": "...", ...}；取不到时退回原始文本
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or(text);
            tracing::warn!(path = %path, status = %status, "内容仓库写入失败: {}", message);
            return Err(AppError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ContentsResponse = resp.json().await.map_err(|e| AppError::Remote {
            status: 500,
            message: format!("解析内容仓库响应失败: {}", e),
        })?;

        Ok(StoredContent {
            sha: parsed.content.sha,
        })
    }
}
