//! JWT 认证和管理端共享凭证
//!
//! 提供 access token 的签发、验证，以及管理端 Basic Auth 校验。

use axum::http::{header, HeaderMap};
use data_encoding::BASE64;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
}

/// 已通过认证的请求身份，由认证中间件注入
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_ttl_minutes: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_token_ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_ttl_minutes,
        }
    }

    /// 签发 access token，有效期以分钟计
    pub fn issue(&self, user_id: Uuid) -> Result<String, ApiError> {
        let exp = chrono::Utc::now() + chrono::Duration::minutes(self.access_token_ttl_minutes);
        let claims = Claims {
            sub: user_id,
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| ApiError::internal(format!("Token generation failed: {}", err)))
    }

    /// 验证并解析 access token
    ///
    /// 签名错误、过期、格式损坏统一折叠成一个 Unauthorized，
    /// 不把底层密码学细节泄露给调用方。
    pub fn verify(&self, token: &str) -> Result<Uuid, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims.sub)
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))
    }

    /// 从请求头提取并验证 Bearer token
    pub fn extract_user_from_headers(&self, headers: &HeaderMap) -> Result<Uuid, ApiError> {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?;

        self.verify(token)
    }
}

/// 管理端共享凭证（低保证模式）
///
/// `Authorization: Basic base64(username:secret)`，与环境配置的
/// 固定值比较，只用于管理端路由。
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    secret: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let encoded = auth_header
            .strip_prefix("Basic ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?;

        let decoded = BASE64
            .decode(encoded.as_bytes())
            .map_err(|_| ApiError::unauthorized("Invalid credentials"))?;
        let decoded =
            String::from_utf8(decoded).map_err(|_| ApiError::unauthorized("Invalid credentials"))?;

        let (username, secret) = decoded
            .split_once(':')
            .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

        if username != self.username || secret != self.secret {
            return Err(ApiError::unauthorized("Invalid credentials"));
        }

        Ok(())
    }
}
