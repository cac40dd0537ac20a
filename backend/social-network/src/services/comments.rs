/// Comment service - comments live under a post and are visible to signed-in users
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::{
    authorize, evaluate_comment, require_authenticated, Action, Actor, CommentTarget,
};
use crate::error::{AppError, Result};
use crate::models::{Comment, NewComment, Post};
use crate::repository::Repositories;

/// Comment text, checked after the caller is allowed to write it
#[derive(Debug, Clone, Validate)]
pub struct CommentBody {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: String,
}

#[derive(Clone)]
pub struct CommentService {
    repos: Repositories,
}

impl CommentService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn list_comments(&self, actor: &Actor, post_id: Uuid) -> Result<Vec<Comment>> {
        require_authenticated(actor)?;
        self.find_post(post_id).await?;
        authorize(evaluate_comment(actor, Action::Read, None))?;

        self.repos.comments.list_comments(post_id).await
    }

    pub async fn create_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        body: CommentBody,
    ) -> Result<Comment> {
        let user_id = require_authenticated(actor)?;
        self.find_post(post_id).await?;
        authorize(evaluate_comment(actor, Action::Create, None))?;
        body.validate()?;

        let comment = self
            .repos
            .comments
            .create_comment(NewComment {
                post_id,
                user_id,
                text: body.text,
            })
            .await?;
        info!(comment_id = %comment.id, %post_id, %user_id, "comment created");
        Ok(comment)
    }

    pub async fn get_comment(&self, actor: &Actor, post_id: Uuid, comment_id: Uuid) -> Result<Comment> {
        require_authenticated(actor)?;
        let (post, comment) = self.find_pair(post_id, comment_id).await?;
        authorize(evaluate_comment(actor, Action::Read, Some(&target(&post, &comment))))?;
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        actor: &Actor,
        post_id: Uuid,
        comment_id: Uuid,
        action: Action,
        body: Option<CommentBody>,
    ) -> Result<Comment> {
        require_authenticated(actor)?;
        let (post, comment) = self.find_pair(post_id, comment_id).await?;
        authorize(evaluate_comment(actor, action, Some(&target(&post, &comment))))?;

        // an empty PATCH changes nothing, including `is_updated`
        let Some(body) = body else {
            return Ok(comment);
        };
        body.validate()?;
        let text = body.text;

        let updated = self
            .repos
            .comments
            .update_comment(comment_id, text)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        info!(%comment_id, %post_id, "comment updated");
        Ok(updated)
    }

    pub async fn delete_comment(&self, actor: &Actor, post_id: Uuid, comment_id: Uuid) -> Result<()> {
        require_authenticated(actor)?;
        let (post, comment) = self.find_pair(post_id, comment_id).await?;
        authorize(evaluate_comment(actor, Action::Delete, Some(&target(&post, &comment))))?;

        if !self.repos.comments.delete_comment(comment_id).await? {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }
        info!(%comment_id, %post_id, "comment deleted");
        Ok(())
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Post> {
        self.repos
            .posts
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    async fn find_pair(&self, post_id: Uuid, comment_id: Uuid) -> Result<(Post, Comment)> {
        let post = self.find_post(post_id).await?;
        let comment = self
            .repos
            .comments
            .find_comment(post_id, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        Ok((post, comment))
    }
}

fn target(post: &Post, comment: &Comment) -> CommentTarget {
    CommentTarget {
        owner_id: comment.user_id,
        post_owner_id: post.owner_id,
    }
}
