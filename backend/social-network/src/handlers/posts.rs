/// Post handlers - HTTP endpoints for post operations
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{post_url, OwnerSummary};
use crate::domain::{Action, Actor, LikeOutcome, SearchQuery};
use crate::error::Result;
use crate::models::{Post, ScheduledPost, ScheduledPostStatus};
use crate::repository::Repositories;
use crate::services::{PostCreation, PostDraft, PostEdit, PostService};

/// Full representation for signed-in callers
#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: Uuid,
    pub url: String,
    pub owner: OwnerSummary,
    pub title: String,
    pub text: String,
    pub content: Option<String>,
    pub is_updated: bool,
    pub created_at: DateTime<Utc>,
    pub likes_count: i64,
    pub like: String,
    pub comments: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let url = post_url(post.id);
        Self {
            id: post.id,
            like: format!("{url}like/"),
            comments: format!("{url}comments/"),
            url,
            owner: OwnerSummary::new(post.owner_id, post.owner_username),
            title: post.title,
            text: post.text,
            content: post.content,
            is_updated: post.is_updated,
            created_at: post.created_at,
            likes_count: post.likes_count,
        }
    }
}

/// Reduced representation for anonymous callers
#[derive(Debug, Serialize, ToSchema)]
pub struct RestrictedPostResponse {
    pub title: String,
    pub text: String,
    pub owner: OwnerSummary,
}

impl From<Post> for RestrictedPostResponse {
    fn from(post: Post) -> Self {
        Self {
            title: post.title,
            text: post.text,
            owner: OwnerSummary::new(post.owner_id, post.owner_username),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduledPostResponse {
    pub id: Uuid,
    pub status: ScheduledPostStatus,
    pub title: String,
    pub run_at: DateTime<Utc>,
}

impl From<ScheduledPost> for ScheduledPostResponse {
    fn from(job: ScheduledPost) -> Self {
        Self {
            id: job.id,
            status: job.status,
            title: job.title,
            run_at: job.run_at,
        }
    }
}

// Bodies are checked by the service after authorization, so missing
// fields deserialize to defaults instead of failing extraction.

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    /// Reference to an already uploaded content file
    pub content: Option<String>,
    /// ISO-8601 instant in the future; defers creation
    pub scheduled_time: Option<String>,
}

/// Body of PUT: title and text are required, a missing content clears it
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplacePostRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    pub content: Option<String>,
}

/// Body of PATCH: every field optional
#[derive(Debug, Deserialize, ToSchema)]
pub struct PatchPostRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PostListQuery {
    /// Case-insensitive substring of title or text
    pub search: Option<String>,
}

fn service(repos: &web::Data<Repositories>) -> PostService {
    PostService::new(repos.get_ref().clone())
}

/// Anonymous callers see the restricted representation
fn render(actor: &Actor, post: Post) -> HttpResponse {
    if actor.is_authenticated() {
        HttpResponse::Ok().json(PostResponse::from(post))
    } else {
        HttpResponse::Ok().json(RestrictedPostResponse::from(post))
    }
}

#[utoipa::path(
    get,
    path = "/api/social/posts/",
    tag = "posts",
    params(PostListQuery),
    responses(
        (status = 200, description = "Posts, newest first", body = [PostResponse])
    )
)]
pub async fn list_posts(
    repos: web::Data<Repositories>,
    actor: Actor,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse> {
    let search = SearchQuery::parse(query.search.as_deref());
    let posts = service(&repos).list_posts(search.as_ref()).await?;

    if actor.is_authenticated() {
        let body: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
        Ok(HttpResponse::Ok().json(body))
    } else {
        let body: Vec<RestrictedPostResponse> =
            posts.into_iter().map(RestrictedPostResponse::from).collect();
        Ok(HttpResponse::Ok().json(body))
    }
}

/// Create a post, or schedule it when `scheduled_time` is given
#[utoipa::path(
    post,
    path = "/api/social/posts/",
    tag = "posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 202, description = "Post scheduled", body = ScheduledPostResponse),
        (status = 400, description = "Invalid input or scheduled time"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    repos: web::Data<Repositories>,
    actor: Actor,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    let created = service(&repos)
        .create_post(
            &actor,
            PostDraft {
                title: req.title,
                text: req.text,
                content: req.content,
                scheduled_time: req.scheduled_time,
            },
        )
        .await?;

    match created {
        PostCreation::Created(post) => Ok(HttpResponse::Created().json(PostResponse::from(post))),
        PostCreation::Scheduled(job) => {
            Ok(HttpResponse::Accepted().json(ScheduledPostResponse::from(job)))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/social/posts/{id}/",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post", body = PostResponse),
        (status = 404, description = "Post not found")
    )
)]
pub async fn get_post(
    repos: web::Data<Repositories>,
    actor: Actor,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = service(&repos).get_post(&actor, *post_id).await?;
    Ok(render(&actor, post))
}

#[utoipa::path(
    put,
    path = "/api/social/posts/{id}/",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = ReplacePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn replace_post(
    repos: web::Data<Repositories>,
    actor: Actor,
    post_id: web::Path<Uuid>,
    req: web::Json<ReplacePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    let edit = PostEdit {
        title: req.title,
        text: req.text,
        content: req.content,
    };
    let post = service(&repos)
        .update_post(&actor, *post_id, Action::Update, edit)
        .await?;
    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

#[utoipa::path(
    patch,
    path = "/api/social/posts/{id}/",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = PatchPostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn patch_post(
    repos: web::Data<Repositories>,
    actor: Actor,
    post_id: web::Path<Uuid>,
    req: web::Json<PatchPostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    let edit = PostEdit {
        title: req.title,
        text: req.text,
        content: req.content,
    };
    let post = service(&repos)
        .update_post(&actor, *post_id, Action::PartialUpdate, edit)
        .await?;
    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

#[utoipa::path(
    delete,
    path = "/api/social/posts/{id}/",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Neither owner nor admin"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    repos: web::Data<Repositories>,
    actor: Actor,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service(&repos).delete_post(&actor, *post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Like the post, or remove the like when already liked
#[utoipa::path(
    post,
    path = "/api/social/posts/{id}/like/",
    tag = "posts",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "State after the toggle", body = LikeOutcome),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_like(
    repos: web::Data<Repositories>,
    actor: Actor,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = service(&repos).toggle_like(&actor, *post_id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}
