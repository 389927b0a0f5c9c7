//! 用户Repository接口定义

use crate::entities::user::User;
use crate::errors::DomainResult;
use async_trait::async_trait;
use uuid::Uuid;

/// 用户Repository接口
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建新用户，用户名冲突返回 Validation 错误
    async fn create(&self, user: &User) -> DomainResult<User>;

    /// 更新用户（用户名、刷新令牌）
    async fn update(&self, user: &User) -> DomainResult<User>;

    /// 根据ID查找用户
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>>;

    /// 根据用户名查找用户，区分大小写
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>>;

    /// 根据持久化的刷新令牌查找用户
    async fn find_by_refresh_token(&self, refresh_token: &str) -> DomainResult<Option<User>>;

    /// 列出所有用户（管理端）
    async fn find_all(&self) -> DomainResult<Vec<User>>;

    /// 删除用户（管理端）
    async fn delete(&self, id: Uuid) -> DomainResult<bool>;
}
