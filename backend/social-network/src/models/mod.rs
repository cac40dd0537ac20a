/// Data models for the social network service
///
/// Records map 1:1 onto the PostgreSQL schema in `migrations/`. The `New*` and
/// `*Changes` structs are the write-side inputs handed to repositories.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    /// Opaque reference to a stored picture
    pub picture: Option<String>,
    pub is_staff: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub last_login: Option<DateTime<Utc>>,
    pub last_request: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// User joined with relation counters
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// Partial update of a user's own profile; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.picture.is_none()
            && self.password_hash.is_none()
    }
}

/// Post joined with its owner's username and like count
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_username: Option<String>,
    pub title: String,
    pub text: String,
    /// Opaque reference to an attached content file
    pub content: Option<String>,
    pub is_updated: bool,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_id: Uuid,
    pub title: String,
    pub text: String,
    pub content: Option<String>,
}

/// Owner and creation time are absent: they never change.
///
/// `content` is doubly optional: `None` keeps the stored path, `Some(None)`
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub text: Option<String>,
    pub content: Option<Option<String>>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && self.content.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub text: String,
    pub is_updated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
}

/// Like edge: user -> post
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Follow edge: follower -> followee
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScheduledPostStatus {
    Pending,
    /// Claimed by a worker; reclaimable once the lease runs out
    Running,
    Completed,
    Failed,
}

impl ScheduledPostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduledPostStatus::Pending => "pending",
            ScheduledPostStatus::Running => "running",
            ScheduledPostStatus::Completed => "completed",
            ScheduledPostStatus::Failed => "failed",
        }
    }
}

impl TryFrom<String> for ScheduledPostStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(ScheduledPostStatus::Pending),
            "running" => Ok(ScheduledPostStatus::Running),
            "completed" => Ok(ScheduledPostStatus::Completed),
            "failed" => Ok(ScheduledPostStatus::Failed),
            other => Err(format!("unknown scheduled post status '{other}'")),
        }
    }
}

/// Deferred post creation job
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduledPost {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub text: String,
    pub content_path: Option<String>,
    pub run_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: ScheduledPostStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub post_id: Option<Uuid>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewScheduledPost {
    pub owner_id: Uuid,
    pub title: String,
    pub text: String,
    pub content_path: Option<String>,
    pub run_at: DateTime<Utc>,
}

/// Filters accepted by the user listing
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub email: Option<String>,
}

/// Identity resolved from a valid, unrevoked access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub is_staff: bool,
    /// Token identifier, needed to revoke it on logout
    pub token_id: String,
    pub token_expires_at: DateTime<Utc>,
}
