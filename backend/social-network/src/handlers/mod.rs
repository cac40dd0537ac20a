/// HTTP handlers and the JSON representations they return
pub mod auth;
pub mod comments;
pub mod health;
pub mod posts;
pub mod users;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Short message body used by follow, logout and similar endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Who owns a post or comment
#[derive(Debug, Serialize, ToSchema)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub username: Option<String>,
    pub url: String,
}

impl OwnerSummary {
    pub fn new(id: Uuid, username: Option<String>) -> Self {
        Self {
            id,
            username,
            url: user_url(id),
        }
    }
}

pub(crate) fn user_url(id: Uuid) -> String {
    format!("/api/user/{id}/")
}

pub(crate) fn post_url(id: Uuid) -> String {
    format!("/api/social/posts/{id}/")
}
