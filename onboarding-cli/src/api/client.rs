//! HTTP client for the onboarding backend

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};

use super::endpoints::{Endpoints, api_url};
use super::error::SyncError;
use super::models::{CreateUserRequest, HealthStatus, UpsertUserResponse, UserPatch};
use super::UserBackend;
use crate::config::ApiConfig;

/// Header carrying the host's opaque init-data token on every request
pub const INIT_DATA_HEADER: &str = "X-Telegram-Init-Data";

/// reqwest-backed implementation of [`UserBackend`]
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    endpoints: Endpoints,
    init_data: String,
}

impl BackendClient {
    pub fn new(api: &ApiConfig, init_data: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .connect_timeout(Duration::from_secs(api.timeout_secs.min(10)))
            .user_agent(concat!("onboarding-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: api.base_url.clone(),
            endpoints: api.endpoints.clone(),
            init_data: init_data.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        api_url(&self.base_url, endpoint, params)
    }

    /// Turn a non-2xx response into a [`SyncError::Status`]
    async fn check(response: Response) -> Result<Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        log::warn!("Backend returned {}: {}", status, body);
        Err(SyncError::from_status(status.as_u16(), &body))
    }
}

#[async_trait]
impl UserBackend for BackendClient {
    async fn upsert_user(&self, request: &CreateUserRequest) -> Result<UpsertUserResponse, SyncError> {
        let url = self.url(&self.endpoints.users, &[]);
        log::debug!("POST {} telegram_id={}", url, request.telegram_id);

        let response = self
            .client
            .post(&url)
            .header(INIT_DATA_HEADER, &self.init_data)
            .json(request)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let body: UpsertUserResponse = response.json().await?;
        if !body.success {
            log::warn!(
                "Upsert of user {} not confirmed: {}",
                request.telegram_id,
                body.message.as_deref().unwrap_or("no message")
            );
        }
        log::info!(
            "User {} {}",
            request.telegram_id,
            if body.created { "created" } else { "found" }
        );
        Ok(body)
    }

    async fn patch_user(&self, telegram_id: i64, patch: &UserPatch) -> Result<(), SyncError> {
        let id = telegram_id.to_string();
        let url = self.url(&self.endpoints.user_update, &[("telegram_id", &id)]);
        log::debug!("PATCH {} {:?}", url, patch);

        let response = self
            .client
            .patch(&url)
            .header(INIT_DATA_HEADER, &self.init_data)
            .json(patch)
            .send()
            .await?;
        Self::check(response).await?;

        log::info!("User {} updated", telegram_id);
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus, SyncError> {
        let url = self.url(&self.endpoints.health, &[]);
        let response = self
            .client
            .get(&url)
            .header(INIT_DATA_HEADER, &self.init_data)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::Field;
    use httpmock::Method::PATCH;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(base_url: String, init_data: &str) -> BackendClient {
        let api = ApiConfig {
            base_url,
            ..ApiConfig::default()
        };
        BackendClient::new(&api, init_data).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_user_sends_body_and_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/v1/users")
                    .header(INIT_DATA_HEADER, "user=abc&hash=def")
                    .json_body(json!({ "telegram_id": 42, "username": "alex" }));
                then.status(200).json_body(json!({
                    "success": true,
                    "message": "found",
                    "user": { "telegram_id": 42, "name": "Alex", "town": "Oslo" },
                    "created": false
                }));
            })
            .await;

        let client = client_for(server.url("/api/v1"), "user=abc&hash=def");
        let response = client
            .upsert_user(&CreateUserRequest {
                telegram_id: 42,
                username: Some("alex".into()),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        let user = response.user.unwrap();
        assert_eq!(user.field(Field::Name), Some("Alex"));
        assert_eq!(user.field(Field::Town), Some("Oslo"));
    }

    #[tokio::test]
    async fn test_unconfirmed_upsert_still_returns_user() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users");
                then.status(200).json_body(json!({
                    "success": false,
                    "message": "profile locked",
                    "user": { "telegram_id": 5, "name": "Alex" }
                }));
            })
            .await;

        let client = client_for(server.base_url(), "");
        let response = client
            .upsert_user(&CreateUserRequest {
                telegram_id: 5,
                username: None,
            })
            .await
            .unwrap();

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("profile locked"));
        assert_eq!(response.user.unwrap().field(Field::Name), Some("Alex"));
    }

    #[tokio::test]
    async fn test_patch_user_targets_user_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/api/v1/users/42")
                    .json_body(json!({ "town": "NY" }));
                then.status(200)
                    .json_body(json!({ "success": true, "message": "updated" }));
            })
            .await;

        let client = client_for(server.url("/api/v1"), "token");
        client
            .patch_user(42, &UserPatch::single(Field::Town, "NY"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_patch_user_error_detail() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PATCH).path("/users/42");
                then.status(404)
                    .json_body(json!({ "detail": "User not found" }));
            })
            .await;

        let client = client_for(server.base_url(), "");
        let err = client
            .patch_user(42, &UserPatch::single(Field::Name, "Al"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SyncError::Status {
                status: 404,
                detail: "User not found".into()
            }
        );
    }

    #[tokio::test]
    async fn test_upsert_malformed_body_is_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users");
                then.status(200).body("not json");
            })
            .await;

        let client = client_for(server.base_url(), "");
        let err = client
            .upsert_user(&CreateUserRequest {
                telegram_id: 1,
                username: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/health");
                then.status(200).json_body(json!({
                    "status": "OK",
                    "database": "connected",
                    "debug": true
                }));
            })
            .await;

        let client = client_for(server.base_url(), "");
        let health = client.health().await.unwrap();
        assert!(health.is_ok());
        assert_eq!(health.debug, Some(true));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Nothing listens on port 1
        let client = client_for("http://127.0.0.1:1".to_string(), "");
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, SyncError::Unreachable(_)), "got {:?}", err);
    }
}
