/// User profile, listing and follow endpoints
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::posts::PostResponse;
use super::{user_url, DetailResponse};
use crate::error::Result;
use crate::models::{AuthenticatedUser, UserFilter, UserProfile};
use crate::repository::Repositories;
use crate::services::{ProfileUpdate, UserService};

/// Self representation, returned by `/me/`
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSelfResponse {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub followers: String,
    pub following: String,
    pub posts: String,
    pub liked_posts: String,
    pub last_login: Option<DateTime<Utc>>,
    pub last_request: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<UserProfile> for UserSelfResponse {
    fn from(profile: UserProfile) -> Self {
        let user = profile.user;
        let base = user_url(user.id);
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_staff: user.is_staff,
            bio: user.bio,
            picture: user.picture,
            followers_count: profile.followers_count,
            following_count: profile.following_count,
            posts_count: profile.posts_count,
            followers: format!("{base}followers/"),
            following: format!("{base}following/"),
            posts: format!("{base}posts/"),
            liked_posts: format!("{base}liked-posts/"),
            last_login: user.last_login,
            last_request: user.last_request,
            created_at: user.created_at,
        }
    }
}

/// Detail representation of another user
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetailResponse {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub bio: Option<String>,
    pub picture: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub followers: String,
    pub following: String,
    pub posts: String,
}

impl From<UserProfile> for UserDetailResponse {
    fn from(profile: UserProfile) -> Self {
        let user = profile.user;
        let base = user_url(user.id);
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_staff: user.is_staff,
            bio: user.bio,
            picture: user.picture,
            followers_count: profile.followers_count,
            following_count: profile.following_count,
            posts_count: profile.posts_count,
            followers: format!("{base}followers/"),
            following: format!("{base}following/"),
            posts: format!("{base}posts/"),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListItem {
    pub id: Uuid,
    pub url: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
}

impl From<UserProfile> for UserListItem {
    fn from(profile: UserProfile) -> Self {
        let user = profile.user;
        Self {
            id: user.id,
            url: user_url(user.id),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            picture: user.picture,
            followers_count: profile.followers_count,
            following_count: profile.following_count,
        }
    }
}

/// Entry in a followers/following listing
#[derive(Debug, Serialize, ToSchema)]
pub struct FollowUserItem {
    pub id: Uuid,
    pub url: String,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub picture: Option<String>,
    pub posts: String,
}

impl From<UserProfile> for FollowUserItem {
    fn from(profile: UserProfile) -> Self {
        let user = profile.user;
        let url = user_url(user.id);
        Self {
            id: user.id,
            posts: format!("{url}posts/"),
            url,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            picture: user.picture,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    pub bio: Option<String>,
    #[validate(length(max = 500))]
    pub picture: Option<String>,
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListQuery {
    /// Case-insensitive substring of username, first or last name
    pub search: Option<String>,
    /// Exact email, case-insensitive
    pub email: Option<String>,
}

fn service(repos: &web::Data<Repositories>) -> UserService {
    UserService::new(repos.get_ref().clone())
}

#[utoipa::path(
    get,
    path = "/api/user/me/",
    tag = "users",
    responses(
        (status = 200, description = "Own profile", body = UserSelfResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(
    repos: web::Data<Repositories>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    let profile = service(&repos).get_profile(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(UserSelfResponse::from(profile)))
}

/// Update own profile (PUT and PATCH behave the same: absent fields are kept)
#[utoipa::path(
    patch,
    path = "/api/user/me/",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserSelfResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Email or username taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    repos: web::Data<Repositories>,
    auth: AuthenticatedUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let req = req.into_inner();

    let profile = service(&repos)
        .update_profile(
            auth.user_id,
            ProfileUpdate {
                email: req.email,
                username: req.username,
                first_name: req.first_name,
                last_name: req.last_name,
                bio: req.bio,
                picture: req.picture,
                password: req.password,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(UserSelfResponse::from(profile)))
}

#[utoipa::path(
    get,
    path = "/api/user/list/",
    tag = "users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Matching users", body = [UserListItem]),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    repos: web::Data<Repositories>,
    _auth: AuthenticatedUser,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let filter = UserFilter {
        search: query.search,
        email: query.email,
    };

    let users: Vec<UserListItem> = service(&repos)
        .list_users(&filter)
        .await?
        .into_iter()
        .map(UserListItem::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}/",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User detail", body = UserDetailResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    repos: web::Data<Repositories>,
    _auth: AuthenticatedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let profile = service(&repos).get_profile(*user_id).await?;
    Ok(HttpResponse::Ok().json(UserDetailResponse::from(profile)))
}

/// Follow the user, or unfollow when already following
#[utoipa::path(
    post,
    path = "/api/user/{id}/",
    tag = "users",
    params(("id" = Uuid, Path, description = "User to follow or unfollow")),
    responses(
        (status = 200, description = "Now following, or unfollowed", body = DetailResponse),
        (status = 400, description = "You cannot follow yourself."),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_follow(
    repos: web::Data<Repositories>,
    auth: AuthenticatedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = service(&repos)
        .toggle_follow(auth.user_id, *user_id)
        .await?;
    Ok(HttpResponse::Ok().json(DetailResponse::new(outcome.message())))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}/followers/",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Users following this user", body = [FollowUserItem]),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_followers(
    repos: web::Data<Repositories>,
    _auth: AuthenticatedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let users: Vec<FollowUserItem> = service(&repos)
        .followers(*user_id)
        .await?
        .into_iter()
        .map(FollowUserItem::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}/following/",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Users this user follows", body = [FollowUserItem]),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_following(
    repos: web::Data<Repositories>,
    _auth: AuthenticatedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let users: Vec<FollowUserItem> = service(&repos)
        .following(*user_id)
        .await?
        .into_iter()
        .map(FollowUserItem::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}/posts/",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Posts owned by the user", body = [PostResponse]),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_user_posts(
    repos: web::Data<Repositories>,
    _auth: AuthenticatedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let posts: Vec<PostResponse> = service(&repos)
        .posts(*user_id)
        .await?
        .into_iter()
        .map(PostResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(posts))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}/liked-posts/",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Posts the user liked", body = [PostResponse]),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_liked_posts(
    repos: web::Data<Repositories>,
    _auth: AuthenticatedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let posts: Vec<PostResponse> = service(&repos)
        .liked_posts(*user_id)
        .await?
        .into_iter()
        .map(PostResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(posts))
}
