//! 用户服务单元测试
//!
//! 覆盖注册、登录、刷新令牌生命周期和管理端操作。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{DomainError, DomainResult, User, UserRepository};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::clock::Clock;
use crate::mailer::{Mailer, MailerError};
use crate::password::{PasswordHasher, PasswordHasherError};
use crate::services::user_service::*;

#[derive(Default)]
struct InMemoryUserRepository {
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
        Ok(self.data.read().await.values().cloned().collect())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.data.write().await.remove(&id).is_some())
    }
}

/// 测试用明文哈希器，避免 bcrypt 拖慢单元测试
struct PlainHasher;

#[async_trait]
impl PasswordHasher for PlainHasher {
    async fn hash(&self, plaintext: &str) -> Result<String, PasswordHasherError> {
        Ok(format!("hashed:{}", plaintext))
    }

    async fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool, PasswordHasherError> {
        Ok(hashed == format!("hashed:{}", plaintext))
    }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: RwLock<Vec<String>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, _subject: &str, _body: &str) -> Result<(), MailerError> {
        self.sent.write().await.push(to.to_string());
        Ok(())
    }
}

fn build_service() -> (UserService, Arc<InMemoryUserRepository>, Arc<RecordingMailer>) {
    let repository = Arc::new(InMemoryUserRepository::default());
    let mailer = Arc::new(RecordingMailer::default());
    let service = UserService::new(UserServiceDependencies {
        user_repository: repository.clone(),
        password_hasher: Arc::new(PlainHasher),
        clock: Arc::new(FixedClock(Utc::now())),
        mailer: mailer.clone(),
    });
    (service, repository, mailer)
}

fn register_request(username: &str) -> RegisterUserRequest {
    RegisterUserRequest {
        username: username.to_string(),
        password: "secret".to_string(),
    }
}

#[tokio::test]
async fn register_creates_user_and_sends_welcome_mail() {
    let (service, repository, mailer) = build_service();

    let user = service.register(register_request("alice")).await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.password_hash, "hashed:secret");
    assert!(user.refresh_token.is_none());

    assert_eq!(repository.find_all().await.unwrap().len(), 1);
    assert_eq!(mailer.sent.read().await.as_slice(), ["alice"]);
}

#[tokio::test]
async fn register_duplicate_username_is_validation_error() {
    let (service, repository, _) = build_service();

    service.register(register_request("alice")).await.unwrap();
    let result = service.register(register_request("alice")).await;

    assert!(matches!(result, Err(DomainError::Validation { .. })));
    // 没有创建第二个用户
    assert_eq!(repository.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let (service, _, _) = build_service();

    let result = service
        .register(RegisterUserRequest {
            username: "".to_string(),
            password: "secret".to_string(),
        })
        .await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));
}

#[tokio::test]
async fn authenticate_with_wrong_password_is_unauthorized() {
    let (service, _, _) = build_service();
    service.register(register_request("alice")).await.unwrap();

    let result = service
        .authenticate(AuthenticateUserRequest {
            username: "alice".to_string(),
            password: "wrong".to_string(),
        })
        .await;

    assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
}

#[tokio::test]
async fn authenticate_unknown_user_is_unauthorized() {
    let (service, _, _) = build_service();

    let result = service
        .authenticate(AuthenticateUserRequest {
            username: "ghost".to_string(),
            password: "secret".to_string(),
        })
        .await;

    assert!(matches!(result, Err(DomainError::Unauthorized { .. })));
}

#[tokio::test]
async fn refresh_token_lifecycle() {
    let (service, _, _) = build_service();
    let user = service.register(register_request("alice")).await.unwrap();

    let token = service.issue_refresh_token(&user).await.unwrap();
    assert_eq!(token.len(), 64);

    // 刷新找回同一个用户，令牌不轮换
    let refreshed = service.refresh(&token).await.unwrap();
    assert_eq!(refreshed.id, user.id);
    let refreshed_again = service.refresh(&token).await.unwrap();
    assert_eq!(refreshed_again.id, user.id);

    // 重新签发会使旧令牌失效
    let new_token = service.issue_refresh_token(&user).await.unwrap();
    assert_ne!(token, new_token);
    assert!(matches!(
        service.refresh(&token).await,
        Err(DomainError::Unauthorized { .. })
    ));
    assert!(service.refresh(&new_token).await.is_ok());
}

#[tokio::test]
async fn logout_invalidates_refresh_token_permanently() {
    let (service, _, _) = build_service();
    let user = service.register(register_request("alice")).await.unwrap();
    let token = service.issue_refresh_token(&user).await.unwrap();

    service.logout(&token).await.unwrap();

    assert!(matches!(
        service.refresh(&token).await,
        Err(DomainError::Unauthorized { .. })
    ));
    // 第二次登出同样失败，令牌已经不存在
    assert!(matches!(
        service.logout(&token).await,
        Err(DomainError::Unauthorized { .. })
    ));
}

#[tokio::test]
async fn oauth_user_is_created_once() {
    let (service, repository, _) = build_service();

    let first = service.find_or_create_oauth_user("google-sub-1").await.unwrap();
    let second = service.find_or_create_oauth_user("google-sub-1").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(repository.find_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn admin_rename_rejects_duplicate_username() {
    let (service, _, _) = build_service();
    let alice = service.register(register_request("alice")).await.unwrap();
    service.register(register_request("bob")).await.unwrap();

    let result = service.update_username(alice.id, "bob".to_string()).await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));

    // 改回自己的名字是允许的
    assert!(service
        .update_username(alice.id, "alice".to_string())
        .await
        .is_ok());
}

#[tokio::test]
async fn admin_delete_missing_user_is_not_found() {
    let (service, _, _) = build_service();

    let result = service.delete_user(Uuid::new_v4()).await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}
