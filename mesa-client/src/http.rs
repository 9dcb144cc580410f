//! HTTP client for the back-office REST API
//!
//! [`AuthApi`] and [`NotificationApi`] are the seams the session manager and
//! the realtime hub depend on; [`NetworkHttpClient`] is the reqwest-backed
//! implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::client::{LoginRequest, LoginResponse};
use shared::{ApiResponse, ErrorCode, NotificationCounts, User};

use crate::{ClientConfig, ClientError, ClientResult};

/// Auth endpoints
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /api/auth/login`
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse>;

    /// `GET /api/auth/me`
    async fn me(&self, token: &str) -> ClientResult<User>;

    /// `POST /api/auth/logout`
    async fn logout(&self, token: &str) -> ClientResult<()>;
}

/// Notification recount endpoint
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// `GET /api/admin/notifications/count`
    async fn notification_counts(&self, token: &str) -> ClientResult<NotificationCounts>;
}

/// Body of a successful response: the `ApiResponse` envelope or the bare payload
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Body<T> {
    Envelope(ApiResponse<T>),
    Bare(T),
}

/// Network HTTP client
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: Client,
    base_url: String,
}

impl NetworkHttpClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> ClientResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Self::status_error(status, &text));
        }

        match serde_json::from_str::<Body<T>>(&text) {
            Ok(Body::Envelope(envelope)) => {
                if !envelope.is_success() {
                    return Err(Self::envelope_error(&envelope));
                }
                envelope
                    .data
                    .ok_or_else(|| ClientError::InvalidResponse("Missing response data".into()))
            }
            Ok(Body::Bare(data)) => Ok(data),
            Err(e) => Err(ClientError::InvalidResponse(e.to_string())),
        }
    }

    fn envelope_error<T>(envelope: &ApiResponse<T>) -> ClientError {
        match envelope.error_code() {
            Some(ErrorCode::TokenExpired) => ClientError::TokenExpired,
            Some(ErrorCode::InvalidCredentials) => ClientError::InvalidCredentials,
            Some(code) => ClientError::Api {
                code,
                message: envelope.message.clone(),
            },
            None => ClientError::Internal(envelope.message.clone()),
        }
    }

    fn status_error(status: StatusCode, text: &str) -> ClientError {
        // 尝试解析为 API 错误响应
        if let Ok(envelope) = serde_json::from_str::<ApiResponse<serde_json::Value>>(text) {
            match envelope.error_code() {
                Some(ErrorCode::TokenExpired) => return ClientError::TokenExpired,
                Some(ErrorCode::InvalidCredentials) => return ClientError::InvalidCredentials,
                _ => {}
            }
        }
        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized(text.to_string()),
            StatusCode::FORBIDDEN => ClientError::Forbidden(text.to_string()),
            StatusCode::NOT_FOUND => ClientError::NotFound(text.to_string()),
            _ => ClientError::Internal(format!("{status}: {text}")),
        }
    }
}

#[async_trait]
impl AuthApi for NetworkHttpClient {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(request)
            .send()
            .await?;

        // 任何 4xx 都视为凭证错误，不区分用户名/密码
        let status = response.status();
        if status.is_client_error() {
            tracing::debug!(status = %status, "Login rejected by server");
            return Err(ClientError::InvalidCredentials);
        }

        match Self::handle_response(response).await {
            Err(e) if e.is_auth_failure() => Err(ClientError::InvalidCredentials),
            other => other,
        }
    }

    async fn me(&self, token: &str) -> ClientResult<User> {
        self.get("/api/auth/me", token).await
    }

    async fn logout(&self, token: &str) -> ClientResult<()> {
        let response = self
            .client
            .post(self.url("/api/auth/logout"))
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(Self::status_error(status, &text))
        }
    }
}

#[async_trait]
impl NotificationApi for NetworkHttpClient {
    async fn notification_counts(&self, token: &str) -> ClientResult<NotificationCounts> {
        self.get("/api/admin/notifications/count", token).await
    }
}
