#![allow(dead_code)]

//! 集成测试公共设施：内存版 Repository 和路由构建

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc, Weekday};
use tokio::sync::RwLock;
use uuid::Uuid;

use application::{
    BlobStorage, Clock, LocalMessageBroadcaster, Mailer, MailerError, MessageService,
    MessageServiceDependencies, PasswordHasher, PasswordHasherError, RequestRateLimiter,
    StorageError, SystemClock, UserService, UserServiceDependencies,
};
use domain::{
    AttachmentDescriptor, DomainError, DomainResult, Message, MessageRepository, User,
    UserMessageStats, UserRepository,
};
use web_api::{router, AdminCredentials, AppState, JwtService};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-key-32-chars";
pub const TEST_ADMIN_USERNAME: &str = "admin";
pub const TEST_ADMIN_SECRET: &str = "test-admin-secret";

#[derive(Default)]
pub struct InMemoryUserRepository {
    data: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> DomainResult<User> {
        let mut guard = self.data.write().await;
        if guard.values().any(|u| u.username == user.username) {
            return Err(DomainError::validation("Username already exists"));
        }
        guard.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> DomainResult<User> {
        let mut guard = self.data.write().await;
        if !guard.contains_key(&user.id) {
            return Err(DomainError::not_found("User not found"));
        }
        guard.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        Ok(self.data.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        Ok(self
            .data
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> DomainResult<Option<User>> {
        Ok(self
            .data
            .read()
            .await
            .values()
            .find(|u| u.refresh_token.as_deref() == Some(refresh_token))
            .cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self.data.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn delete(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.data.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    data: RwLock<HashMap<Uuid, Message>>,
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: &Message) -> DomainResult<Message> {
        self.data.write().await.insert(message.id, message.clone());
        Ok(message.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Message>> {
        Ok(self.data.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<Message>> {
        let mut messages: Vec<Message> = self.data.read().await.values().cloned().collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    async fn update(&self, message: &Message) -> DomainResult<Message> {
        let mut guard = self.data.write().await;
        if !guard.contains_key(&message.id) {
            return Err(DomainError::not_found("Message not found"));
        }
        guard.insert(message.id, message.clone());
        Ok(message.clone())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.data.write().await.remove(&id).is_some())
    }

    async fn count_total(&self) -> DomainResult<u64> {
        Ok(self.data.read().await.len() as u64)
    }

    async fn stats_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<UserMessageStats>> {
        let guard = self.data.read().await;
        let mut per_user: HashMap<Uuid, (u64, u64)> = HashMap::new();
        for message in guard.values().filter(|m| m.created_at >= since) {
            let entry = per_user.entry(message.user_id).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += message.text.len() as u64;
        }
        Ok(per_user
            .into_iter()
            .map(|(user_id, (count, total_len))| UserMessageStats {
                user_id,
                message_count: count,
                avg_text_length: total_len as f64 / count as f64,
            })
            .collect())
    }
}

/// 测试用明文哈希器
pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, PasswordHasherError> {
        Ok(format!("hashed:{}", plaintext))
    }

    async fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, PasswordHasherError> {
        Ok(hashed == format!("hashed:{}", plaintext))
    }
}

pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), MailerError> {
        Ok(())
    }
}

/// 不落盘的存储假实现，返回本地路径描述符
pub struct FakeBlobStorage;

#[async_trait]
impl BlobStorage for FakeBlobStorage {
    async fn store(
        &self,
        original_name: &str,
        _content: Vec<u8>,
    ) -> Result<AttachmentDescriptor, StorageError> {
        Ok(AttachmentDescriptor::Local {
            path: format!("uploads/{}", original_name),
            original_name: original_name.to_string(),
        })
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub struct TestRouterOptions {
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub restricted_days: Vec<Weekday>,
    pub fixed_now: Option<DateTime<Utc>>,
}

impl Default for TestRouterOptions {
    fn default() -> Self {
        Self {
            rate_limit_max: 1000,
            rate_limit_window: Duration::from_secs(60),
            restricted_days: Vec::new(),
            fixed_now: None,
        }
    }
}

pub fn build_router(options: TestRouterOptions) -> Router {
    let user_repository = Arc::new(InMemoryUserRepository::default());
    let message_repository = Arc::new(InMemoryMessageRepository::default());
    let password_hasher = Arc::new(PlainPasswordHasher);
    let clock: Arc<dyn Clock> = match options.fixed_now {
        Some(now) => Arc::new(FixedClock(now)),
        None => Arc::new(SystemClock),
    };
    let broadcaster = Arc::new(LocalMessageBroadcaster::new(64));

    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository,
        password_hasher,
        clock: clock.clone(),
        mailer: Arc::new(NullMailer),
    }));

    let message_service = Arc::new(MessageService::new(MessageServiceDependencies {
        message_repository,
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
        blob_storage: Arc::new(FakeBlobStorage),
    }));

    let jwt_service = Arc::new(JwtService::new(TEST_JWT_SECRET, 15));
    let rate_limiter = Arc::new(RequestRateLimiter::new(
        options.rate_limit_max,
        options.rate_limit_window,
    ));

    let state = AppState::new(
        user_service,
        message_service,
        broadcaster,
        jwt_service,
        rate_limiter,
        AdminCredentials::new(TEST_ADMIN_USERNAME, TEST_ADMIN_SECRET),
        clock,
        options.restricted_days,
        None,
        "http://localhost:5173".to_string(),
    );

    router(state)
}

pub fn build_default_router() -> Router {
    build_router(TestRouterOptions::default())
}
