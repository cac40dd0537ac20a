/// Post service - business logic for post operations
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::schedule::validate_scheduled_time;
use crate::domain::{
    authorize, evaluate_post, require_authenticated, toggle_like, Action, Actor, LikeOutcome,
    PostTarget, SearchQuery,
};
use crate::error::{AppError, Result};
use crate::models::{NewPost, NewScheduledPost, Post, PostChanges, ScheduledPost};
use crate::repository::Repositories;

/// Input of post creation, validated once the caller may create posts
#[derive(Debug, Clone, Validate)]
pub struct PostDraft {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub text: String,
    /// Reference to an already uploaded content file
    #[validate(length(max = 500))]
    pub content: Option<String>,
    /// ISO-8601 instant; when set the post is created later by the worker
    pub scheduled_time: Option<String>,
}

/// Fields sent with PUT or PATCH
///
/// PUT replaces the post: a missing `content` clears it. PATCH only touches
/// the fields that are present.
#[derive(Debug, Clone, Default, Validate)]
pub struct PostEdit {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub text: Option<String>,
    #[validate(length(max = 500))]
    pub content: Option<String>,
}

impl PostEdit {
    fn into_changes(self, action: Action) -> Result<PostChanges> {
        if action != Action::Update {
            return Ok(PostChanges {
                title: self.title,
                text: self.text,
                content: self.content.map(Some),
            });
        }
        let (Some(title), Some(text)) = (self.title, self.text) else {
            return Err(AppError::Validation(
                "title and text are required.".to_string(),
            ));
        };
        Ok(PostChanges {
            title: Some(title),
            text: Some(text),
            content: Some(self.content),
        })
    }
}

#[derive(Debug, Clone)]
pub enum PostCreation {
    Created(Post),
    Scheduled(ScheduledPost),
}

#[derive(Clone)]
pub struct PostService {
    repos: Repositories,
}

impl PostService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list_posts(&self, search: Option<&SearchQuery>) -> Result<Vec<Post>> {
        self.repos.posts.list_posts(search).await
    }

    pub async fn get_post(&self, actor: &Actor, post_id: Uuid) -> Result<Post> {
        let post = self.find(post_id).await?;
        authorize(evaluate_post(actor, Action::Read, Some(&target(&post))))?;
        Ok(post)
    }

    /// Create a post now, or queue it when `scheduled_time` is set
    pub async fn create_post(&self, actor: &Actor, draft: PostDraft) -> Result<PostCreation> {
        let owner_id = require_authenticated(actor)?;
        authorize(evaluate_post(actor, Action::Create, None))?;
        draft.validate()?;

        let scheduled_time = draft
            .scheduled_time
            .as_deref()
            .filter(|raw| !raw.is_empty());

        if let Some(raw) = scheduled_time {
            let run_at = validate_scheduled_time(raw, Utc::now())?;
            let job = self
                .repos
                .scheduled_posts
                .enqueue(NewScheduledPost {
                    owner_id,
                    title: draft.title,
                    text: draft.text,
                    content_path: draft.content,
                    run_at,
                })
                .await?;
            info!(job_id = %job.id, %owner_id, run_at = %job.run_at, "post scheduled");
            return Ok(PostCreation::Scheduled(job));
        }

        let post = self
            .repos
            .posts
            .create_post(NewPost {
                owner_id,
                title: draft.title,
                text: draft.text,
                content: draft.content,
            })
            .await?;
        info!(post_id = %post.id, %owner_id, "post created");
        Ok(PostCreation::Created(post))
    }

    /// Apply an update or partial update; only the owner may edit
    pub async fn update_post(
        &self,
        actor: &Actor,
        post_id: Uuid,
        action: Action,
        edit: PostEdit,
    ) -> Result<Post> {
        require_authenticated(actor)?;
        let post = self.find(post_id).await?;
        authorize(evaluate_post(actor, action, Some(&target(&post))))?;
        edit.validate()?;

        let changes = edit.into_changes(action)?;
        // nothing to apply, so the post is not marked as edited
        if changes.is_empty() {
            return Ok(post);
        }

        let updated = self
            .repos
            .posts
            .update_post(post_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        info!(%post_id, "post updated");
        Ok(updated)
    }

    pub async fn delete_post(&self, actor: &Actor, post_id: Uuid) -> Result<()> {
        require_authenticated(actor)?;
        let post = self.find(post_id).await?;
        authorize(evaluate_post(actor, Action::Delete, Some(&target(&post))))?;

        if !self.repos.posts.delete_post(post_id).await? {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        info!(%post_id, by_staff = actor.is_staff, "post deleted");
        Ok(())
    }

    /// Like the post, or take the like back when already liked
    pub async fn toggle_like(&self, actor: &Actor, post_id: Uuid) -> Result<LikeOutcome> {
        let user_id = require_authenticated(actor)?;
        self.find(post_id).await?;

        let outcome = toggle_like(self.repos.likes.as_ref(), user_id, post_id).await?;
        info!(%post_id, %user_id, liked = outcome.liked, "like toggled");
        Ok(outcome)
    }

    async fn find(&self, post_id: Uuid) -> Result<Post> {
        self.repos
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }
}

fn target(post: &Post) -> PostTarget {
    PostTarget {
        owner_id: post.owner_id,
    }
}
