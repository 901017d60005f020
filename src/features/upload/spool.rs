use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::AppError;

/// 已落盘的上传内容
///
/// 解码后的字节先写入临时文件，上传前再读回消费。guard 被 drop 时
/// 临时文件被且仅被删除一次，成功与失败两类退出路径都覆盖，避免
/// 热进程多次调用后磁盘被临时文件占满。
pub struct SpooledImage {
    file: NamedTempFile,
}

impl SpooledImage {
    /// 将解码后的字节写入新建的临时文件。
    pub async fn write(bytes: &[u8]) -> Result<Self, AppError> {
        let file = NamedTempFile::new()
            .map_err(|e| AppError::Internal(format!("创建临时文件失败: {}", e)))?;
        tokio::fs::write(file.path(), bytes)
            .await
            .map_err(|e| AppError::Internal(format!("写入临时文件失败: {}", e)))?;
        Ok(Self { file })
    }

    /// 读回临时文件内容（上传前唯一的缓冲消费点）。
    pub async fn read(&self) -> Result<Vec<u8>, AppError> {
        tokio::fs::read(self.file.path())
            .await
            .map_err(|e| AppError::Internal(format!("读取临时文件失败: {}", e)))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::SpooledImage;

    #[tokio::test]
    async fn spool_round_trips_bytes() {
        let spool = SpooledImage::write(b"hello").await.expect("spool");
        assert_eq!(spool.read().await.expect("read"), b"hello");
    }

    /// 无论上传成功与否，guard 离开作用域后临时文件必须已被删除。
    #[tokio::test]
    async fn spool_file_is_deleted_on_drop() {
        let spool = SpooledImage::write(b"hello").await.expect("spool");
        let path = spool.path().to_path_buf();
        assert!(path.exists());
        drop(spool);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn spool_file_is_deleted_when_an_error_path_unwinds_the_scope() {
        let path;
        {
            let spool = SpooledImage::write(b"oops").await.expect("spool");
            path = spool.path().to_path_buf();
            // 模拟上传失败后的提前返回：guard 随作用域结束被 drop
        }
        assert!(!path.exists());
    }
}
