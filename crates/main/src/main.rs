//! 主应用程序入口
//!
//! 组装配置、数据库、服务和路由，启动 Axum 服务器。

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use application::{
    LocalMessageBroadcaster, MessageService, MessageServiceDependencies, RequestRateLimiter,
    SystemClock, UserService, UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, BcryptPasswordHasher, GoogleOAuthClient, HttpObjectStorage, LocalDiskStorage,
    PgMessageRepository, PgUserRepository, TracingMailer,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AdminCredentials, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 读取环境变量配置，生产部署应使用 AppConfig::from_env
    let config = AppConfig::from_env_with_defaults();
    if let Err(err) = config.validate() {
        tracing::warn!(error = %err, "configuration failed validation, development defaults in use");
    }

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );

    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    // Repository 和外部协作方实现
    let user_repository = Arc::new(PgUserRepository::new(pg_pool.clone()));
    let message_repository = Arc::new(PgMessageRepository::new(pg_pool));
    let password_hasher = Arc::new(BcryptPasswordHasher::new(config.server.bcrypt_cost));
    let clock = Arc::new(SystemClock);
    let mailer = Arc::new(TracingMailer);
    let broadcaster = Arc::new(LocalMessageBroadcaster::new(config.broadcast.capacity));

    // 上传后端由配置选择
    let blob_storage: Arc<dyn application::BlobStorage> = match config.upload.backend.as_str() {
        "object" => Arc::new(HttpObjectStorage::new(
            config.upload.object_endpoint.clone().unwrap_or_default(),
            config.upload.object_bucket.clone().unwrap_or_default(),
            config.upload.object_access_key.clone().unwrap_or_default(),
            config.upload.object_public_url.clone().unwrap_or_default(),
        )),
        _ => Arc::new(LocalDiskStorage::new(config.upload.local_dir.clone())),
    };

    // 应用层服务
    let user_service = Arc::new(UserService::new(UserServiceDependencies {
        user_repository,
        password_hasher,
        clock: clock.clone(),
        mailer,
    }));

    let message_service = Arc::new(MessageService::new(MessageServiceDependencies {
        message_repository,
        clock: clock.clone(),
        broadcaster: broadcaster.clone(),
        blob_storage,
    }));

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_ttl_minutes,
    ));

    let rate_limiter = Arc::new(RequestRateLimiter::new(
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_secs),
    ));

    // 定期清理过期的限流配额
    let cleanup_limiter = rate_limiter.clone();
    let cleanup_interval = Duration::from_secs(config.rate_limit.window_secs.max(1) * 2);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cleanup_interval);
        loop {
            ticker.tick().await;
            cleanup_limiter.cleanup_expired();
        }
    });

    // OAuth 客户端按需启用
    let oauth_client = if config.oauth.google_client_id.is_empty() {
        tracing::info!("google oauth not configured, /auth/google disabled");
        None
    } else {
        Some(Arc::new(GoogleOAuthClient::new(
            config.oauth.google_client_id.clone(),
            config.oauth.google_client_secret.clone(),
            &config.oauth.redirect_url,
        )?))
    };

    let state = AppState::new(
        user_service,
        message_service,
        broadcaster,
        jwt_service,
        rate_limiter,
        AdminCredentials::new(config.admin.username.clone(), config.admin.secret.clone()),
        clock,
        config.posting_window.restricted_days.clone(),
        oauth_client,
        config.server.frontend_origin.clone(),
    );

    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("留言板服务器启动在 http://{}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
