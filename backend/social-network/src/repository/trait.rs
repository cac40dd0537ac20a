use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::SearchQuery;
use crate::error::Result;
use crate::models::{
    Comment, NewComment, NewPost, NewScheduledPost, NewUser, Post, PostChanges, ScheduledPost,
    User, UserChanges, UserFilter, UserProfile,
};

/// A set of directed edges with a uniqueness constraint on the pair.
/// Implemented for likes (user -> post) and follows (follower -> followee).
#[async_trait]
pub trait EdgeSet: Send + Sync {
    /// Check whether the edge exists
    async fn contains(&self, source: Uuid, target: Uuid) -> Result<bool>;

    /// Insert the edge. Returns `false` when the pair already existed.
    async fn insert(&self, source: Uuid, target: Uuid) -> Result<bool>;

    /// Remove the edge. Returns `false` when there was nothing to remove.
    async fn remove(&self, source: Uuid, target: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user. Fails with `Conflict` on a duplicate email or username.
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Apply a partial update; `None` when the user does not exist
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>>;

    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>>;

    /// Users matching `search` on username/first/last name and an exact email
    async fn search_profiles(&self, filter: &UserFilter) -> Result<Vec<UserProfile>>;

    /// Users following `user_id`
    async fn list_followers(&self, user_id: Uuid) -> Result<Vec<UserProfile>>;

    /// Users `user_id` follows
    async fn list_following(&self, user_id: Uuid) -> Result<Vec<UserProfile>>;

    /// Stamp `last_request` and return the fresh record
    async fn record_request(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<User>>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, new_post: NewPost) -> Result<Post>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// All posts, newest first, filtered on title/text when `search` is set
    async fn list_posts(&self, search: Option<&SearchQuery>) -> Result<Vec<Post>>;

    async fn list_posts_by_owner(&self, owner_id: Uuid) -> Result<Vec<Post>>;

    async fn list_liked_posts(&self, user_id: Uuid) -> Result<Vec<Post>>;

    /// Apply changes and set `is_updated`; `None` when the post is gone
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>>;

    /// Delete a post with its comments and likes
    async fn delete_post(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment>;

    /// Find a comment under a specific post
    async fn find_comment(&self, post_id: Uuid, id: Uuid) -> Result<Option<Comment>>;

    /// Comments on a post, oldest first
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>>;

    async fn update_comment(&self, id: Uuid, text: String) -> Result<Option<Comment>>;

    async fn delete_comment(&self, id: Uuid) -> Result<bool>;
}

/// Revoked token identifiers (logout)
#[async_trait]
pub trait TokenRevocationRepository: Send + Sync {
    async fn revoke(&self, jti: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()>;

    async fn is_revoked(&self, jti: &str) -> Result<bool>;

    /// Drop entries whose token would have expired anyway
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Queue of deferred post creations
#[async_trait]
pub trait ScheduledPostRepository: Send + Sync {
    async fn enqueue(&self, job: NewScheduledPost) -> Result<ScheduledPost>;

    async fn find_job(&self, id: Uuid) -> Result<Option<ScheduledPost>>;

    /// Claim up to `limit` pending jobs due at `now`, bumping their attempt counter.
    /// A claimed job is invisible to other claimers until it is marked or its
    /// claim is older than `lease`.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
        limit: i64,
    ) -> Result<Vec<ScheduledPost>>;

    async fn mark_completed(&self, id: Uuid, post_id: Uuid) -> Result<()>;

    /// Record a failure. The job returns to pending unless `give_up` is set.
    async fn mark_failed(&self, id: Uuid, error: &str, give_up: bool) -> Result<()>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<()>;
}
