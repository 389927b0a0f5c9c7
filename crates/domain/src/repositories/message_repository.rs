//! 留言Repository接口定义

use crate::entities::message::Message;
use crate::errors::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 单个用户的留言统计
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UserMessageStats {
    pub user_id: Uuid,
    pub message_count: u64,
    pub avg_text_length: f64,
}

/// 留言Repository接口
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 创建新留言
    async fn create(&self, message: &Message) -> DomainResult<Message>;

    /// 根据ID查找留言
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Message>>;

    /// 按创建时间倒序列出所有留言
    async fn find_all(&self) -> DomainResult<Vec<Message>>;

    /// 更新留言文本
    async fn update(&self, message: &Message) -> DomainResult<Message>;

    /// 删除留言，返回是否存在
    async fn delete(&self, id: Uuid) -> DomainResult<bool>;

    /// 留言总数
    async fn count_total(&self) -> DomainResult<u64>;

    /// 自指定时间以来按用户聚合的留言数和平均文本长度
    async fn stats_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<UserMessageStats>>;
}
