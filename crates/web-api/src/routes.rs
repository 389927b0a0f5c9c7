use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::Redirect,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use application::{
    AuthenticateUserRequest, CreateMessageRequest, RegisterUserRequest, UpdateMessageRequest,
    UploadMessageRequest,
};
use domain::{AttachmentDescriptor, Message, User, UserMessageStats, MAX_UPLOAD_BYTES};

use crate::{
    auth::AuthUser,
    error::ApiError,
    middleware::{log_request, rate_limit, require_admin, require_auth, restrict_posting_days},
    state::AppState,
    websocket,
};

#[derive(Debug, Deserialize)]
struct RegisterPayload {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshPayload {
    #[serde(rename = "refreshToken")]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminUserPayload {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthCallbackQuery {
    state: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenPairResponse {
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenResponse {
    access_token: String,
}

/// 对外的留言表示，作者字段按 token subject 的口径命名为 user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: Uuid,
    pub text: String,
    pub user: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentDescriptor>,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            text: message.text.clone(),
            user: message.user_id,
            created_at: message.created_at,
            attachment: message.attachment.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserStatsDto {
    user: Uuid,
    message_count: u64,
    avg_text_length: f64,
}

impl From<UserMessageStats> for UserStatsDto {
    fn from(stats: UserMessageStats) -> Self {
        Self {
            user: stats.user_id,
            message_count: stats.message_count,
            avg_text_length: stats.avg_text_length,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_path: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/messages", get(list_messages))
        .route("/messages/stats", get(message_stats))
        .route("/messages/total-messages", get(total_messages))
        .route("/messages/{id}", get(get_message))
        .route("/users/register", post(register_user))
        .route("/users/login", post(login_user))
        .route("/users/refresh", post(refresh_token))
        .route("/users/logout", post(logout_user))
        .route("/auth/google", get(google_login))
        .route("/auth/google/callback", get(google_callback))
        .route("/ws", get(websocket::websocket_upgrade));

    // 写路由：认证在前，发帖时间窗口在后
    let protected = Router::new()
        .route("/messages", post(create_message))
        .route("/messages/{id}", put(update_message).delete(delete_message))
        .route(
            "/messages/upload",
            post(upload_message).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024)),
        )
        .route_layer(from_fn_with_state(state.clone(), restrict_posting_days))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/admin/users", get(list_users))
        .route(
            "/admin/users/{id}",
            put(admin_update_user).delete(admin_delete_user),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .frontend_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("*")),
        )
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .fallback(route_not_found)
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(from_fn(log_request))
        .layer(cors)
        .with_state(state)
}

async fn welcome() -> &'static str {
    "Welcome to the message board"
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// 未匹配的路由走同一套分类错误出口
async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state
        .user_service
        .register(RegisterUserRequest {
            username: payload.username.unwrap_or_default(),
            password: payload.password.unwrap_or_default(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let user = state
        .user_service
        .authenticate(AuthenticateUserRequest {
            username: payload.username.unwrap_or_default(),
            password: payload.password.unwrap_or_default(),
        })
        .await?;

    let access_token = state.jwt_service.issue(user.id)?;
    let refresh_token = state.user_service.issue_refresh_token(&user).await?;

    Ok(Json(TokenPairResponse {
        access_token,
        refresh_token,
    }))
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let user = state
        .user_service
        .refresh(&payload.refresh_token.unwrap_or_default())
        .await?;

    let access_token = state.jwt_service.issue(user.id)?;
    Ok(Json(AccessTokenResponse { access_token }))
}

async fn logout_user(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<Value>, ApiError> {
    state
        .user_service
        .logout(&payload.refresh_token.unwrap_or_default())
        .await?;

    Ok(Json(json!({ "message": "Logged out" })))
}

async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let messages = state.message_service.list().await?;
    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}

async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageDto>, ApiError> {
    let message = state.message_service.get(id).await?;
    Ok(Json(MessageDto::from(&message)))
}

async fn create_message(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(payload): Json<MessagePayload>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let message = state
        .message_service
        .create(CreateMessageRequest {
            text: payload.text.unwrap_or_default(),
            user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MessagePayload>,
) -> Result<Json<MessageDto>, ApiError> {
    let message = state
        .message_service
        .update(UpdateMessageRequest {
            id,
            text: payload.text.unwrap_or_default(),
        })
        .await?;

    Ok(Json(MessageDto::from(&message)))
}

async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.message_service.delete(id).await?;
    Ok(Json(json!({ "message": "Message deleted" })))
}

async fn upload_message(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut text: Option<String> = None;
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::validation(format!("Malformed multipart body: {}", err)))?
    {
        match field.name() {
            Some("file") => {
                let original_name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::validation("File name is required"))?;
                let declared_mime = field
                    .content_type()
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::validation("File content type is required"))?;
                let content = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::validation(format!("Failed to read file: {}", err)))?;
                file = Some((original_name, declared_mime, content.to_vec()));
            }
            Some("text") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| ApiError::validation(format!("Failed to read text: {}", err)))?;
                text = Some(value);
            }
            _ => {}
        }
    }

    let (original_name, declared_mime, content) =
        file.ok_or_else(|| ApiError::validation("File is required"))?;

    let message = state
        .message_service
        .create_with_attachment(UploadMessageRequest {
            text,
            user_id,
            original_name,
            declared_mime,
            content,
        })
        .await?;

    let (file_url, file_path) = match &message.attachment {
        Some(AttachmentDescriptor::Object { url, .. }) => (Some(url.clone()), None),
        Some(AttachmentDescriptor::Local { path, .. }) => (None, Some(path.clone())),
        None => (None, None),
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully",
            file_url,
            file_path,
        }),
    ))
}

async fn message_stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserStatsDto>>, ApiError> {
    let stats = state.message_service.stats().await?;
    Ok(Json(stats.into_iter().map(UserStatsDto::from).collect()))
}

async fn total_messages(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let total = state.message_service.total_messages().await?;
    Ok(Json(json!({ "totalMessages": total })))
}

async fn google_login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let client = state
        .oauth_client
        .as_ref()
        .ok_or_else(|| ApiError::not_found("OAuth login is not configured"))?;

    let url = client.authorize_url()?;
    Ok(Redirect::temporary(&url))
}

async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Redirect, ApiError> {
    let client = state
        .oauth_client
        .as_ref()
        .ok_or_else(|| ApiError::not_found("OAuth login is not configured"))?;

    let callback_state = query
        .state
        .ok_or_else(|| ApiError::unauthorized("OAuth callback without state"))?;
    let code = query
        .code
        .ok_or_else(|| ApiError::unauthorized("OAuth callback without code"))?;

    let profile = client.exchange_code(&callback_state, &code).await?;
    let user = state
        .user_service
        .find_or_create_oauth_user(&profile.sub)
        .await?;

    tracing::info!(user_id = %user.id, "google login successful");

    let token = state.jwt_service.issue(user.id)?;
    let target = format!(
        "{}/?token={}",
        state.frontend_origin.trim_end_matches('/'),
        token
    );
    Ok(Redirect::temporary(&target))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users))
}

async fn admin_update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUserPayload>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .user_service
        .update_username(id, payload.username.unwrap_or_default())
        .await?;

    Ok(Json(user))
}

async fn admin_delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.user_service.delete_user(id).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}
