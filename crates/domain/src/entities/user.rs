use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 用户实体
///
/// 密码哈希和刷新令牌不会被序列化到任何响应中。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// 当前有效的刷新令牌，同一时间最多一个
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn register(
        id: Uuid,
        username: String,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 覆盖刷新令牌，旧值即刻失效
    pub fn set_refresh_token(&mut self, token: String, now: DateTime<Utc>) {
        self.refresh_token = Some(token);
        self.updated_at = now;
    }

    /// 清空刷新令牌，登出后旧令牌不再可用
    pub fn clear_refresh_token(&mut self, now: DateTime<Utc>) {
        self.refresh_token = None;
        self.updated_at = now;
    }

    pub fn rename(&mut self, username: String, now: DateTime<Utc>) {
        self.username = username;
        self.updated_at = now;
    }
}
