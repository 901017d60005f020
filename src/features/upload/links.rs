use crate::config::{GithubConfig, PrimaryLink, UploadConfig};

/// 一次上传对应的公开链接集合
///
/// 由存储键与进程配置确定性推导，请求结束即丢弃。配置了代理前缀时，
/// 每条 URL 都是前缀 + 完整原始 URL 的文本拼接（拼在整个 URL 前，
/// 而非路径前）。
#[derive(Debug, Clone)]
pub struct AssetLinks {
    /// Pages CDN 直链：`https://{owner}.{pages_host}/{storage_key}`
    pub cdn_url: String,
    /// 仓库 blob 页面：`https://{code_host}/{owner}/{repo}/blob/{branch}/{storage_key}`
    pub blob_url: String,
    /// 嵌入主链接的 Markdown 图片引用
    pub markdown: String,
}

impl AssetLinks {
    pub fn build(github: &GithubConfig, upload: &UploadConfig, storage_key: &str) -> Self {
        let cdn_url = apply_proxy(
            upload,
            format!(
                "https://{}.{}/{}",
                github.owner, upload.pages_host, storage_key
            ),
        );
        let blob_url = apply_proxy(
            upload,
            format!(
                "https://{}/{}/{}/blob/{}/{}",
                upload.code_host, github.owner, github.repo, github.branch, storage_key
            ),
        );
        let markdown = format!(
            "![image]({})",
            match upload.primary_link {
                PrimaryLink::Cdn => &cdn_url,
                PrimaryLink::Blob => &blob_url,
            }
        );
        Self {
            cdn_url,
            blob_url,
            markdown,
        }
    }

    /// 按部署配置返回主链接。
    pub fn primary(&self, link: PrimaryLink) -> &str {
        match link {
            PrimaryLink::Cdn => &self.cdn_url,
            PrimaryLink::Blob => &self.blob_url,
        }
    }
}

fn apply_proxy(upload: &UploadConfig, url: String) -> String {
    match upload.proxy_prefix.as_deref() {
        Some(prefix) if !prefix.is_empty() => format!("{}{}", prefix, url),
        _ => url,
    }
}
