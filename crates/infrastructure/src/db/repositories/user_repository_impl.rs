//! 用户Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{DomainError, DomainResult, User, UserRepository};
use sqlx::{query, query_as, FromRow, PgPool};
use uuid::Uuid;

/// 数据库用户模型
#[derive(Debug, Clone, FromRow)]
struct DbUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbUser> for User {
    fn from(db_user: DbUser) -> Self {
        User {
            id: db_user.id,
            username: db_user.username,
            password_hash: db_user.password_hash,
            refresh_token: db_user.refresh_token,
            created_at: db_user.created_at,
            updated_at: db_user.updated_at,
        }
    }
}

/// 用户Repository实现
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 唯一约束冲突映射为验证错误，其余映射为数据库错误
fn map_sqlx_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return DomainError::validation("Username already exists");
        }
    }
    DomainError::database_error(err.to_string())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> DomainResult<User> {
        let result = query_as::<_, DbUser>(
            r#"
            INSERT INTO users (id, username, password_hash, refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, password_hash, refresh_token, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.into())
    }

    async fn update(&self, user: &User) -> DomainResult<User> {
        let result = query_as::<_, DbUser>(
            r#"
            UPDATE users
            SET username = $2, refresh_token = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, username, password_hash, refresh_token, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.refresh_token)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.into())
    }

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>> {
        let result = query_as::<_, DbUser>(
            r#"
            SELECT id, username, password_hash, refresh_token, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database_error(e.to_string()))?;

        Ok(result.map(|u| u.into()))
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        let result = query_as::<_, DbUser>(
            r#"
            SELECT id, username, password_hash, refresh_token, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database_error(e.to_string()))?;

        Ok(result.map(|u| u.into()))
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> DomainResult<Option<User>> {
        let result = query_as::<_, DbUser>(
            r#"
            SELECT id, username, password_hash, refresh_token, created_at, updated_at
            FROM users
            WHERE refresh_token = $1
            "#,
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database_error(e.to_string()))?;

        Ok(result.map(|u| u.into()))
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        let users: Vec<DbUser> = query_as(
            r#"
            SELECT id, username, password_hash, refresh_token, created_at, updated_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database_error(e.to_string()))?;

        Ok(users.into_iter().map(|u| u.into()).collect())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<bool> {
        let result = query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database_error(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
