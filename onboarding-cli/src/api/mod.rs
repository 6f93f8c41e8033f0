//! Onboarding backend API
//!
//! The wizard only needs three calls from the backend: an idempotent user
//! upsert, a single-field patch and a liveness probe. [`UserBackend`] is the
//! seam the wizard controller talks through; [`BackendClient`] is the HTTP
//! implementation.

pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;

use async_trait::async_trait;

pub use client::BackendClient;
pub use endpoints::Endpoints;
pub use error::SyncError;
pub use models::{CreateUserRequest, HealthStatus, UpsertUserResponse, UserPatch};

/// Remote user store the wizard synchronizes with
#[async_trait]
pub trait UserBackend: Send + Sync {
    /// Create the user keyed by Telegram id, or return the existing record
    async fn upsert_user(&self, request: &CreateUserRequest) -> Result<UpsertUserResponse, SyncError>;

    /// Update the fields set in `patch`
    async fn patch_user(&self, telegram_id: i64, patch: &UserPatch) -> Result<(), SyncError>;

    /// Liveness probe
    async fn health(&self) -> Result<HealthStatus, SyncError>;
}
