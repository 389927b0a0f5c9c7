use std::sync::Arc;

use application::{Clock, LocalMessageBroadcaster, MessageService, RequestRateLimiter, UserService};
use chrono::Weekday;
use infrastructure::GoogleOAuthClient;

use crate::auth::{AdminCredentials, JwtService};

/// 服务器实例持有的全部共享状态
///
/// 限流器、广播器等可变状态都在这里构造注入，
/// 生命周期跟随服务器启动和停止，不依赖任何模块级单例。
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub message_service: Arc<MessageService>,
    pub broadcaster: Arc<LocalMessageBroadcaster>,
    pub jwt_service: Arc<JwtService>,
    pub rate_limiter: Arc<RequestRateLimiter>,
    pub admin: AdminCredentials,
    pub clock: Arc<dyn Clock>,
    pub restricted_days: Arc<Vec<Weekday>>,
    pub oauth_client: Option<Arc<GoogleOAuthClient>>,
    pub frontend_origin: String,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_service: Arc<UserService>,
        message_service: Arc<MessageService>,
        broadcaster: Arc<LocalMessageBroadcaster>,
        jwt_service: Arc<JwtService>,
        rate_limiter: Arc<RequestRateLimiter>,
        admin: AdminCredentials,
        clock: Arc<dyn Clock>,
        restricted_days: Vec<Weekday>,
        oauth_client: Option<Arc<GoogleOAuthClient>>,
        frontend_origin: String,
    ) -> Self {
        Self {
            user_service,
            message_service,
            broadcaster,
            jwt_service,
            rate_limiter,
            admin,
            clock,
            restricted_days: Arc::new(restricted_days),
            oauth_client,
            frontend_origin,
        }
    }
}
