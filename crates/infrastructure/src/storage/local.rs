//! 本地磁盘存储

use application::{BlobStorage, StorageError};
use async_trait::async_trait;
use domain::AttachmentDescriptor;
use std::path::PathBuf;
use uuid::Uuid;

/// 把上传内容写到本地目录，文件名用 UUID 生成避免碰撞
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStorage for LocalDiskStorage {
    async fn store(
        &self,
        original_name: &str,
        content: Vec<u8>,
    ) -> Result<AttachmentDescriptor, StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| StorageError::io(err.to_string()))?;

        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let file_name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension)
        };

        let path = self.root.join(&file_name);
        tokio::fs::write(&path, content)
            .await
            .map_err(|err| StorageError::io(err.to_string()))?;

        tracing::debug!(path = %path.display(), "stored upload on local disk");

        Ok(AttachmentDescriptor::Local {
            path: path.to_string_lossy().into_owned(),
            original_name: original_name.to_string(),
        })
    }
}
