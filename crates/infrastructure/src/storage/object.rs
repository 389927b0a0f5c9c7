//! HTTP 对象存储
//!
//! 面向 S3 兼容网关的简单客户端：按时间戳前缀生成对象键，
//! 用访问密钥以 Bearer 方式上传，返回公开访问 URL。

use application::{BlobStorage, StorageError};
use async_trait::async_trait;
use chrono::Utc;
use domain::AttachmentDescriptor;

pub struct HttpObjectStorage {
    endpoint: String,
    bucket: String,
    access_key: String,
    public_base_url: String,
    client: reqwest::Client,
}

impl HttpObjectStorage {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key: access_key.into(),
            public_base_url: public_base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// 对象键：上传时刻的毫秒时间戳 + 清洗后的原始文件名
    fn object_key(original_name: &str) -> String {
        let sanitized: String = original_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}-{}", Utc::now().timestamp_millis(), sanitized)
    }
}

#[async_trait]
impl BlobStorage for HttpObjectStorage {
    async fn store(
        &self,
        original_name: &str,
        content: Vec<u8>,
    ) -> Result<AttachmentDescriptor, StorageError> {
        let key = Self::object_key(original_name);
        let upload_url = format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.bucket,
            key
        );

        let response = self
            .client
            .put(&upload_url)
            .bearer_auth(&self.access_key)
            .body(content)
            .send()
            .await
            .map_err(|err| StorageError::backend(err.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::backend(format!(
                "object store returned {}",
                response.status()
            )));
        }

        let url = format!("{}/{}", self.public_base_url.trim_end_matches('/'), key);
        tracing::debug!(key = %key, "uploaded object to storage backend");

        Ok(AttachmentDescriptor::Object { key, url })
    }
}
