//! Request and response bodies of the onboarding backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::wizard::Field;

/// Body of `POST /users`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateUserRequest {
    pub telegram_id: i64,
    pub username: Option<String>,
}

/// Response of `POST /users` (create or return existing)
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertUserResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<RemoteUser>,
    #[serde(default)]
    pub created: bool,
}

/// User record as stored by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteUser {
    #[serde(default)]
    pub telegram_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
}

impl RemoteUser {
    pub fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => self.name.as_deref(),
            Field::Town => self.town.as_deref(),
        }
    }
}

/// Body of `PATCH /users/{telegram_id}`; exactly one field is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
}

impl UserPatch {
    pub fn single(field: Field, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            Field::Name => Self { name: value, town: None },
            Field::Town => Self { name: None, town: value },
        }
    }
}

/// Error body returned with non-2xx responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_detail(self) -> Option<String> {
        let detail = match self.detail {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            Some(Value::Null) | None => None,
            Some(Value::String(_)) => None,
            Some(other) => Some(other.to_string()),
        };
        detail.or(self.message.filter(|m| !m.is_empty()))
    }
}

/// Response of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub debug: Option<bool>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_serializes_single_field() {
        let body = serde_json::to_value(UserPatch::single(Field::Town, "NY")).unwrap();
        assert_eq!(body, json!({ "town": "NY" }));

        let body = serde_json::to_value(UserPatch::single(Field::Name, "Al")).unwrap();
        assert_eq!(body, json!({ "name": "Al" }));
    }

    #[test]
    fn test_create_request_keeps_null_username() {
        let body = serde_json::to_value(CreateUserRequest {
            telegram_id: 7,
            username: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "telegram_id": 7, "username": null }));
    }

    #[test]
    fn test_upsert_response_ignores_extra_fields() {
        let response: UpsertUserResponse = serde_json::from_value(json!({
            "success": true,
            "message": "found",
            "user": {
                "id": 1,
                "telegram_id": 7,
                "username": "alex",
                "name": "Alex",
                "town": "Oslo",
                "premium": false,
                "progress_step": 0,
                "lesson": 0,
                "energy": 100,
                "created_at": "2024-01-01T00:00:00+03:00"
            },
            "created": false
        }))
        .unwrap();

        let user = response.user.unwrap();
        assert_eq!(user.field(Field::Name), Some("Alex"));
        assert_eq!(user.field(Field::Town), Some("Oslo"));
        assert!(!response.created);
    }

    #[test]
    fn test_upsert_response_with_null_user() {
        let response: UpsertUserResponse =
            serde_json::from_value(json!({ "success": true, "user": null })).unwrap();
        assert!(response.user.is_none());
    }

    #[test]
    fn test_health_status() {
        let health: HealthStatus =
            serde_json::from_value(json!({ "status": "OK", "database": "connected" })).unwrap();
        assert!(health.is_ok());
        assert_eq!(health.database.as_deref(), Some("connected"));
    }
}
