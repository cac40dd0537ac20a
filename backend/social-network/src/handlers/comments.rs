/// Comment handlers - nested under `/posts/{post_id}/comments/`
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{post_url, OwnerSummary};
use crate::domain::{Action, Actor};
use crate::error::Result;
use crate::models::Comment;
use crate::repository::Repositories;
use crate::services::{CommentBody, CommentService};

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post: String,
    pub owner: OwnerSummary,
    pub text: String,
    pub is_updated: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post: post_url(comment.post_id),
            owner: OwnerSummary::new(comment.user_id, comment.username),
            text: comment.text,
            is_updated: comment.is_updated,
            created_at: comment.created_at,
        }
    }
}

/// A missing `text` reaches the service as blank and fails validation there
#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PatchCommentRequest {
    pub text: Option<String>,
}

fn service(repos: &web::Data<Repositories>) -> CommentService {
    CommentService::new(repos.get_ref().clone())
}

#[utoipa::path(
    get,
    path = "/api/social/posts/{post_id}/comments/",
    tag = "comments",
    params(("post_id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Comments, oldest first", body = [CommentResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_comments(
    repos: web::Data<Repositories>,
    actor: Actor,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comments: Vec<CommentResponse> = service(&repos)
        .list_comments(&actor, *post_id)
        .await?
        .into_iter()
        .map(CommentResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(comments))
}

#[utoipa::path(
    post,
    path = "/api/social/posts/{post_id}/comments/",
    tag = "comments",
    params(("post_id" = Uuid, Path, description = "Post ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Blank text"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_comment(
    repos: web::Data<Repositories>,
    actor: Actor,
    post_id: web::Path<Uuid>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let body = CommentBody {
        text: req.into_inner().text,
    };
    let comment = service(&repos)
        .create_comment(&actor, *post_id, body)
        .await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

#[utoipa::path(
    get,
    path = "/api/social/posts/{post_id}/comments/{id}/",
    tag = "comments",
    params(
        ("post_id" = Uuid, Path, description = "Post ID"),
        ("id" = Uuid, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "Comment", body = CommentResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Post or comment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_comment(
    repos: web::Data<Repositories>,
    actor: Actor,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = service(&repos)
        .get_comment(&actor, post_id, comment_id)
        .await?;
    Ok(HttpResponse::Ok().json(CommentResponse::from(comment)))
}

#[utoipa::path(
    put,
    path = "/api/social/posts/{post_id}/comments/{id}/",
    tag = "comments",
    params(
        ("post_id" = Uuid, Path, description = "Post ID"),
        ("id" = Uuid, Path, description = "Comment ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 403, description = "Not the comment author"),
        (status = 404, description = "Post or comment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn replace_comment(
    repos: web::Data<Repositories>,
    actor: Actor,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let body = CommentBody {
        text: req.into_inner().text,
    };

    let comment = service(&repos)
        .update_comment(&actor, post_id, comment_id, Action::Update, Some(body))
        .await?;
    Ok(HttpResponse::Ok().json(CommentResponse::from(comment)))
}

#[utoipa::path(
    patch,
    path = "/api/social/posts/{post_id}/comments/{id}/",
    tag = "comments",
    params(
        ("post_id" = Uuid, Path, description = "Post ID"),
        ("id" = Uuid, Path, description = "Comment ID")
    ),
    request_body = PatchCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 403, description = "Not the comment author"),
        (status = 404, description = "Post or comment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn patch_comment(
    repos: web::Data<Repositories>,
    actor: Actor,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<PatchCommentRequest>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let body = req.into_inner().text.map(|text| CommentBody { text });

    let comment = service(&repos)
        .update_comment(&actor, post_id, comment_id, Action::PartialUpdate, body)
        .await?;
    Ok(HttpResponse::Ok().json(CommentResponse::from(comment)))
}

#[utoipa::path(
    delete,
    path = "/api/social/posts/{post_id}/comments/{id}/",
    tag = "comments",
    params(
        ("post_id" = Uuid, Path, description = "Post ID"),
        ("id" = Uuid, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the author, post owner or an admin"),
        (status = 404, description = "Post or comment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    repos: web::Data<Repositories>,
    actor: Actor,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    service(&repos)
        .delete_comment(&actor, post_id, comment_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
