use async_trait::async_trait;

use crate::error::AppError;

/// 内容仓库服务的写入结果
#[derive(Debug, Clone)]
pub struct StoredContent {
    /// 存储内容的摘要（GitHub 为 blob SHA）。只透传，不解释。
    pub sha: String,
}

/// 内容仓库服务接口
///
/// 面向 owner/repo 固定、path 寻址的一次性写入。任何失败对本次请求
/// 都是终态（不重试）；测试中可替换为记录调用次数的桩实现。
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// 将 Base64 编码内容写入 path，返回内容摘要。
    async fn put(
        &self,
        path: &str,
        content_base64: &str,
        commit_message: &str,
    ) -> Result<StoredContent, AppError>;
}
