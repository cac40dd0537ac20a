/// OpenAPI documentation for the social network service
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

use crate::domain::LikeOutcome;
use crate::handlers::{self, auth, comments, posts, users};
use crate::models::ScheduledPostStatus;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Social Network API",
        version = "1.0.0",
        description = "Users, posts, comments, likes and follows. Anonymous callers can browse posts; everything else requires a Bearer token from /api/user/login/.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server"),
    ),
    paths(
        auth::register,
        auth::login,
        auth::logout,
        users::get_me,
        users::update_me,
        users::list_users,
        users::get_user,
        users::toggle_follow,
        users::list_followers,
        users::list_following,
        users::list_user_posts,
        users::list_liked_posts,
        posts::list_posts,
        posts::create_post,
        posts::get_post,
        posts::replace_post,
        posts::patch_post,
        posts::delete_post,
        posts::toggle_like,
        comments::list_comments,
        comments::create_comment,
        comments::get_comment,
        comments::replace_comment,
        comments::patch_comment,
        comments::delete_comment,
    ),
    components(schemas(
        handlers::DetailResponse,
        handlers::OwnerSummary,
        auth::RegisterRequest,
        auth::RegisterResponse,
        auth::LoginRequest,
        auth::LoginResponse,
        users::UserSelfResponse,
        users::UserDetailResponse,
        users::UserListItem,
        users::FollowUserItem,
        users::UpdateProfileRequest,
        posts::PostResponse,
        posts::RestrictedPostResponse,
        posts::ScheduledPostResponse,
        posts::CreatePostRequest,
        posts::ReplacePostRequest,
        posts::PatchPostRequest,
        comments::CommentResponse,
        comments::CommentRequest,
        comments::PatchCommentRequest,
        LikeOutcome,
        ScheduledPostStatus,
    )),
    tags(
        (name = "auth", description = "Registration, login and logout"),
        (name = "users", description = "Profiles, listings and follows"),
        (name = "posts", description = "Posts, search, likes and scheduling"),
        (name = "comments", description = "Comments under a post"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/user/login/"))
                        .build(),
                ),
            )
        }
    }
}

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/api/openapi.json"
    }
}
