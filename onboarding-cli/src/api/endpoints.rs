//! Backend endpoint templates and URL building

use serde::{Deserialize, Serialize};

/// Paths of the backend endpoints, relative to the API base URL.
/// `{name}` segments are replaced with request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub users: String,
    pub user_update: String,
    pub health: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            users: "/users".to_string(),
            user_update: "/users/{telegram_id}".to_string(),
            health: "/health".to_string(),
        }
    }
}

/// Join `base` and `endpoint`, substituting `{key}` placeholders
pub fn api_url(base: &str, endpoint: &str, params: &[(&str, &str)]) -> String {
    let mut url = format!("{}{}", base.trim_end_matches('/'), endpoint);
    for (key, value) in params {
        url = url.replace(&format!("{{{}}}", key), &urlencoding::encode(value));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_plain() {
        assert_eq!(
            api_url("https://host/api/v1", "/users", &[]),
            "https://host/api/v1/users"
        );
        assert_eq!(
            api_url("https://host/api/v1/", "/health", &[]),
            "https://host/api/v1/health"
        );
    }

    #[test]
    fn test_api_url_substitutes_params() {
        let endpoints = Endpoints::default();
        assert_eq!(
            api_url("http://localhost:8000/api/v1", &endpoints.user_update, &[("telegram_id", "123456789")]),
            "http://localhost:8000/api/v1/users/123456789"
        );
    }

    #[test]
    fn test_api_url_unknown_placeholder_left_alone() {
        assert_eq!(
            api_url("http://h", "/users/{telegram_id}", &[("other", "1")]),
            "http://h/users/{telegram_id}"
        );
    }
}
