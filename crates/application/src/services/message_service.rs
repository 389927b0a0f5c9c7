use std::sync::Arc;

use chrono::Duration;
use domain::{
    DomainError, DomainResult, Message, MessageRepository, UploadRules, UserMessageStats,
};
use uuid::Uuid;

use crate::{
    broadcaster::{MessageBroadcast, MessageBroadcaster},
    clock::Clock,
    storage::BlobStorage,
};

#[derive(Debug, Clone)]
pub struct CreateMessageRequest {
    pub text: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateMessageRequest {
    pub id: Uuid,
    pub text: String,
}

/// 带附件的留言创建请求，内容已经缓冲完毕
#[derive(Debug, Clone)]
pub struct UploadMessageRequest {
    pub text: Option<String>,
    pub user_id: Uuid,
    pub original_name: String,
    pub declared_mime: String,
    pub content: Vec<u8>,
}

pub struct MessageServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
    pub broadcaster: Arc<dyn MessageBroadcaster>,
    pub blob_storage: Arc<dyn BlobStorage>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create(&self, request: CreateMessageRequest) -> DomainResult<Message> {
        let message = Message::create(
            Uuid::new_v4(),
            request.text,
            request.user_id,
            self.deps.clock.now(),
            None,
        )?;

        let stored = self.deps.message_repository.create(&message).await?;
        self.publish(&stored).await;
        Ok(stored)
    }

    /// 校验并存储附件，然后创建关联的留言
    ///
    /// 留言行写入失败时已写入的文件不会被回收，只记录告警。
    pub async fn create_with_attachment(
        &self,
        request: UploadMessageRequest,
    ) -> DomainResult<Message> {
        UploadRules::validate_upload(
            &request.original_name,
            &request.declared_mime,
            request.content.len(),
        )?;

        let descriptor = self
            .deps
            .blob_storage
            .store(&request.original_name, request.content)
            .await
            .map_err(|err| DomainError::database_error(err.to_string()))?;

        let text = match request.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => request.original_name.clone(),
        };

        let message = Message::create(
            Uuid::new_v4(),
            text,
            request.user_id,
            self.deps.clock.now(),
            Some(descriptor.clone()),
        )?;

        let stored = match self.deps.message_repository.create(&message).await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(
                    location = descriptor.location(),
                    "message row write failed, stored blob is orphaned"
                );
                return Err(err);
            }
        };

        self.publish(&stored).await;
        Ok(stored)
    }

    pub async fn list(&self) -> DomainResult<Vec<Message>> {
        self.deps.message_repository.find_all().await
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Message> {
        self.deps
            .message_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Message not found"))
    }

    pub async fn update(&self, request: UpdateMessageRequest) -> DomainResult<Message> {
        let mut message = self
            .deps
            .message_repository
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Message not found"))?;

        message.update_text(request.text)?;
        self.deps.message_repository.update(&message).await
    }

    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let deleted = self.deps.message_repository.delete(id).await?;
        if !deleted {
            return Err(DomainError::not_found("Message not found"));
        }
        Ok(())
    }

    pub async fn total_messages(&self) -> DomainResult<u64> {
        self.deps.message_repository.count_total().await
    }

    /// 过去24小时内按用户聚合的统计
    pub async fn stats(&self) -> DomainResult<Vec<UserMessageStats>> {
        let since = self.deps.clock.now() - Duration::hours(24);
        self.deps.message_repository.stats_since(since).await
    }

    /// 发布新留言事件，投递失败不影响已经成功的写入
    async fn publish(&self, message: &Message) {
        let payload = MessageBroadcast {
            message: message.clone(),
        };
        if let Err(err) = self.deps.broadcaster.broadcast(payload).await {
            tracing::warn!(error = %err, "failed to broadcast new message");
        }
    }
}
