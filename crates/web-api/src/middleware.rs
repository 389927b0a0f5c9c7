//! 请求管道中间件
//!
//! 固定顺序：请求日志 → 限流 → Bearer 认证（受保护路由）→
//! 发帖时间窗口（写路由）→ 业务处理器。每一级要么放行，
//! 要么抛出分类错误交给终端错误处理器。

use application::Clock;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use domain::PostingWindowRules;
use std::net::SocketAddr;

use crate::{
    auth::AuthUser,
    error::{ApiError, ErrorName},
    state::AppState,
};

/// 请求日志，纯副作用，永远放行
///
/// 分类失败会在响应 extension 里带上错误名，在这里连同
/// 方法和路径一起落日志。
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    match response.extensions().get::<ErrorName>() {
        Some(ErrorName(name)) => {
            tracing::warn!(%method, %path, status = %response.status(), error = name, "request failed");
        }
        None => {
            tracing::info!(%method, %path, status = %response.status(), "request");
        }
    }

    response
}

/// 客户端标识：优先取代理转发头，否则用对端地址
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 限流：超出窗口配额的请求在这里短路
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&request);
    state.rate_limiter.admit(&key)?;
    Ok(next.run(request).await)
}

/// Bearer 认证：验证通过后把身份注入请求扩展
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = state.jwt_service.extract_user_from_headers(request.headers())?;
    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

/// 发帖时间窗口：只挂在修改留言的路由上
pub async fn restrict_posting_days(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    PostingWindowRules::posting_allowed(state.clock.now(), &state.restricted_days)?;
    Ok(next.run(request).await)
}

/// 管理端 Basic Auth
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.admin.verify_headers(request.headers())?;
    Ok(next.run(request).await)
}
