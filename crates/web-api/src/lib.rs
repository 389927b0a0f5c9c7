//! Web API 层
//!
//! 请求管道（日志 → 限流 → 认证 → 发帖窗口 → 处理器 →
//! 终端错误处理）、路由定义和 WebSocket 实时推送。

pub mod auth;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod websocket;

pub use auth::{AdminCredentials, AuthUser, JwtService};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
