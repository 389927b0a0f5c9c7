//! 基础设施层
//!
//! PostgreSQL Repository、bcrypt 密码哈希、文件存储后端、
//! Google OAuth 客户端和邮件投递的具体实现。

pub mod db;
pub mod mailer;
pub mod oauth;
pub mod password;
pub mod storage;

pub use db::repositories::{PgMessageRepository, PgUserRepository};
pub use db::create_pg_pool;
pub use mailer::TracingMailer;
pub use oauth::{GoogleOAuthClient, GoogleProfile};
pub use password::BcryptPasswordHasher;
pub use storage::{HttpObjectStorage, LocalDiskStorage};
