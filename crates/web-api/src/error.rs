use application::RateLimitError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;

/// 错误响应中的分类名，日志中间件通过 response extension 读取
#[derive(Debug, Clone, Copy)]
pub struct ErrorName(pub &'static str);

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub name: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// 终端错误类型
///
/// 整条中间件链里唯一允许写错误响应体的地方是它的
/// `IntoResponse` 实现，响应格式固定为 `{"error": {"name", "message"}}`。
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, name: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: ErrorDetail {
                    name,
                    message: message.into(),
                },
            },
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "ValidationError", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UnauthorizedError", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "ForbiddenError", message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "TooManyRequestsError",
            message,
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFoundError", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError", message)
    }

    pub fn name(&self) -> &'static str {
        self.body.error.name
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation { message } => ApiError::validation(message),
            DomainError::Unauthorized { message } => ApiError::unauthorized(message),
            DomainError::Forbidden { message } => ApiError::forbidden(message),
            DomainError::TooManyRequests { message } => ApiError::too_many_requests(message),
            DomainError::NotFound { message } => ApiError::not_found(message),
            DomainError::Database { message } => ApiError::internal(message),
        }
    }
}

impl From<RateLimitError> for ApiError {
    fn from(error: RateLimitError) -> Self {
        match error {
            RateLimitError::LimitExceeded { .. } => {
                ApiError::too_many_requests("Too many requests, slow down")
            }
            RateLimitError::Internal { message } => ApiError::internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let name = ErrorName(self.body.error.name);
        let mut response = (self.status, Json(self.body)).into_response();
        response.extensions_mut().insert(name);
        response
    }
}
