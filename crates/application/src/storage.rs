use async_trait::async_trait;
use domain::AttachmentDescriptor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// 文件内容存储接口
///
/// 对象存储本身是外部协作方，这里只定义核心对它的契约：
/// 写入成功后返回足以再次定位内容的附件描述符。
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn store(
        &self,
        original_name: &str,
        content: Vec<u8>,
    ) -> Result<AttachmentDescriptor, StorageError>;
}
