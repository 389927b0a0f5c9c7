use std::sync::Arc;

use domain::{DomainError, DomainResult, User, UserRepository};
use rand::{distr::Alphanumeric, Rng};
use uuid::Uuid;

use crate::{clock::Clock, mailer::Mailer, password::PasswordHasher};

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AuthenticateUserRequest {
    pub username: String,
    pub password: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub mailer: Arc<dyn Mailer>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(&self, request: RegisterUserRequest) -> DomainResult<User> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(DomainError::validation("Username and password required"));
        }

        if self
            .deps
            .user_repository
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(DomainError::validation("Username already exists"));
        }

        let password_hash = self
            .deps
            .password_hasher
            .hash(&request.password)
            .await
            .map_err(|err| DomainError::database_error(err.to_string()))?;

        let now = self.deps.clock.now();
        let user = User::register(Uuid::new_v4(), request.username, password_hash, now);
        let stored = self.deps.user_repository.create(&user).await?;

        // 欢迎邮件尽力投递，失败只记录日志
        if let Err(err) = self
            .deps
            .mailer
            .send(
                &stored.username,
                "Welcome to the message board",
                "Your account has been created.",
            )
            .await
        {
            tracing::warn!(error = %err, "failed to send welcome email");
        }

        Ok(stored)
    }

    pub async fn authenticate(&self, request: AuthenticateUserRequest) -> DomainResult<User> {
        let user = self
            .deps
            .user_repository
            .find_by_username(&request.username)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Invalid credentials"))?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password_hash)
            .await
            .map_err(|err| DomainError::database_error(err.to_string()))?;

        if !password_ok {
            return Err(DomainError::unauthorized("Invalid credentials"));
        }

        Ok(user)
    }

    /// 为用户签发新的刷新令牌，覆盖之前的值
    pub async fn issue_refresh_token(&self, user: &User) -> DomainResult<String> {
        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();

        let mut user = user.clone();
        user.set_refresh_token(token.clone(), self.deps.clock.now());
        self.deps.user_repository.update(&user).await?;

        Ok(token)
    }

    /// 根据刷新令牌找回用户
    ///
    /// 刷新时不轮换令牌，只有登录和登出才改变它。可以收紧为每次
    /// 刷新都轮换，但那会改变可观察行为，这里保持原策略。
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<User> {
        self.deps
            .user_repository
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Invalid refresh token"))
    }

    /// 清空持久化的刷新令牌，旧令牌此后不能再换取 access token
    pub async fn logout(&self, refresh_token: &str) -> DomainResult<()> {
        let mut user = self
            .deps
            .user_repository
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Invalid refresh token"))?;

        user.clear_refresh_token(self.deps.clock.now());
        self.deps.user_repository.update(&user).await?;
        Ok(())
    }

    pub async fn get_user(&self, id: Uuid) -> DomainResult<User> {
        self.deps
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    /// OAuth 登录：按身份提供方的 subject 找用户，不存在则创建
    ///
    /// 密码哈希来自随机串，这样的账号无法通过密码登录。
    pub async fn find_or_create_oauth_user(&self, subject: &str) -> DomainResult<User> {
        if let Some(user) = self
            .deps
            .user_repository
            .find_by_username(subject)
            .await?
        {
            return Ok(user);
        }

        let random_password: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let password_hash = self
            .deps
            .password_hasher
            .hash(&random_password)
            .await
            .map_err(|err| DomainError::database_error(err.to_string()))?;

        let now = self.deps.clock.now();
        let user = User::register(Uuid::new_v4(), subject.to_string(), password_hash, now);
        self.deps.user_repository.create(&user).await
    }

    /// 管理端：列出所有用户
    pub async fn list_users(&self) -> DomainResult<Vec<User>> {
        self.deps.user_repository.find_all().await
    }

    /// 管理端：修改用户名
    pub async fn update_username(&self, id: Uuid, username: String) -> DomainResult<User> {
        if username.trim().is_empty() {
            return Err(DomainError::validation("Username required"));
        }

        if let Some(existing) = self
            .deps
            .user_repository
            .find_by_username(&username)
            .await?
        {
            if existing.id != id {
                return Err(DomainError::validation("Username already exists"));
            }
        }

        let mut user = self
            .deps
            .user_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))?;

        user.rename(username, self.deps.clock.now());
        self.deps.user_repository.update(&user).await
    }

    /// 管理端：删除用户
    pub async fn delete_user(&self, id: Uuid) -> DomainResult<()> {
        let deleted = self.deps.user_repository.delete(id).await?;
        if !deleted {
            return Err(DomainError::not_found("User not found"));
        }
        Ok(())
    }
}
