//! Google OAuth 登录客户端
//!
//! 授权地址生成和授权码换取用户身份。进行中的授权请求
//! （state -> PKCE verifier）保存在进程内存里，不依赖会话层。

use std::collections::HashMap;
use std::sync::Mutex;

use domain::{DomainError, DomainResult};
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;

type ConfiguredClient = Client<
    oauth2::StandardErrorResponse<oauth2::basic::BasicErrorResponseType>,
    oauth2::StandardTokenResponse<oauth2::EmptyExtraTokenFields, oauth2::basic::BasicTokenType>,
    oauth2::StandardTokenIntrospectionResponse<
        oauth2::EmptyExtraTokenFields,
        oauth2::basic::BasicTokenType,
    >,
    oauth2::StandardRevocableToken,
    oauth2::StandardErrorResponse<oauth2::RevocationErrorResponseType>,
    oauth2::EndpointSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
>;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// 身份提供方返回的用户信息
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// 提供方内唯一的用户标识
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

pub struct GoogleOAuthClient {
    client: ConfiguredClient,
    http: reqwest::Client,
    /// 进行中的授权：state -> PKCE verifier
    pending: Mutex<HashMap<String, String>>,
}

impl GoogleOAuthClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: &str,
    ) -> DomainResult<Self> {
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|err| DomainError::validation(err.to_string()))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|err| DomainError::validation(err.to_string()))?;
        let redirect_url = RedirectUrl::new(redirect_url.to_string())
            .map_err(|err| DomainError::validation(format!("invalid redirect url: {}", err)))?;

        let client = BasicClient::new(ClientId::new(client_id.into()))
            .set_client_secret(ClientSecret::new(client_secret.into()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| DomainError::database_error(err.to_string()))?;

        Ok(Self {
            client,
            http,
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// 生成授权跳转地址并登记 state 对应的 PKCE verifier
    pub fn authorize_url(&self) -> DomainResult<String> {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        let mut pending = self
            .pending
            .lock()
            .map_err(|_| DomainError::database_error("oauth state lock poisoned"))?;
        pending.insert(
            csrf_token.secret().clone(),
            pkce_verifier.secret().to_string(),
        );

        Ok(auth_url.to_string())
    }

    /// 回调阶段：校验 state、交换授权码、拉取用户信息
    pub async fn exchange_code(&self, state: &str, code: &str) -> DomainResult<GoogleProfile> {
        let verifier = {
            let mut pending = self
                .pending
                .lock()
                .map_err(|_| DomainError::database_error("oauth state lock poisoned"))?;
            pending
                .remove(state)
                .ok_or_else(|| DomainError::unauthorized("Unknown OAuth state"))?
        };

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier))
            .request_async(&self.http)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "oauth code exchange failed");
                DomainError::unauthorized("OAuth code exchange failed")
            })?;

        let profile: GoogleProfile = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .map_err(|err| DomainError::unauthorized(format!("userinfo request failed: {}", err)))?
            .json()
            .await
            .map_err(|err| DomainError::unauthorized(format!("userinfo decode failed: {}", err)))?;

        Ok(profile)
    }
}
