use crypto_core::password;
use tracing::info;
use uuid::Uuid;

use crate::domain::{toggle_follow, FollowOutcome};
use crate::error::{AppError, Result};
use crate::models::{Post, UserChanges, UserFilter, UserProfile};
use crate::repository::Repositories;

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    repos: Repositories,
}

impl UserService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile> {
        self.repos
            .users
            .find_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<UserProfile> {
        let password_hash = match update.password.as_deref() {
            Some(new_password) => Some(password::hash_password(new_password)?),
            None => None,
        };

        let changes = UserChanges {
            email: update.email.map(|e| e.trim().to_string()),
            username: update.username,
            first_name: update.first_name,
            last_name: update.last_name,
            bio: update.bio,
            picture: update.picture,
            password_hash,
        };

        if !changes.is_empty() {
            let updated = self.repos.users.update_user(user_id, changes).await?;
            if updated.is_none() {
                return Err(AppError::NotFound("User not found".to_string()));
            }
            info!(%user_id, "profile updated");
        }

        self.get_profile(user_id).await
    }

    pub async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserProfile>> {
        self.repos.users.search_profiles(filter).await
    }

    pub async fn followers(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        self.ensure_exists(user_id).await?;
        self.repos.users.list_followers(user_id).await
    }

    pub async fn following(&self, user_id: Uuid) -> Result<Vec<UserProfile>> {
        self.ensure_exists(user_id).await?;
        self.repos.users.list_following(user_id).await
    }

    pub async fn posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
        self.ensure_exists(user_id).await?;
        self.repos.posts.list_posts_by_owner(user_id).await
    }

    pub async fn liked_posts(&self, user_id: Uuid) -> Result<Vec<Post>> {
        self.ensure_exists(user_id).await?;
        self.repos.posts.list_liked_posts(user_id).await
    }

    /// Follow `target_id`, or unfollow when already following
    pub async fn toggle_follow(&self, follower_id: Uuid, target_id: Uuid) -> Result<FollowOutcome> {
        self.ensure_exists(target_id).await?;

        let outcome = toggle_follow(self.repos.follows.as_ref(), follower_id, target_id).await?;
        info!(
            %follower_id,
            %target_id,
            following = outcome.is_following(),
            "follow toggled"
        );
        Ok(outcome)
    }

    async fn ensure_exists(&self, user_id: Uuid) -> Result<()> {
        match self.repos.users.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("User not found".to_string())),
        }
    }
}
