use actix_web::web;

use crate::handlers::{auth, comments, health, posts, users};

/// Register every HTTP route of the service.
///
/// Expects `web::Data<Repositories>` on the app and `JwtAuthMiddleware`
/// wrapped around it.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health))
        .route("/health/ready", web::get().to(health::readiness))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/user")
                        .route("/register/", web::post().to(auth::register))
                        .route("/login/", web::post().to(auth::login))
                        .route("/logout/", web::post().to(auth::logout))
                        .service(
                            web::resource("/me/")
                                .route(web::get().to(users::get_me))
                                .route(web::put().to(users::update_me))
                                .route(web::patch().to(users::update_me)),
                        )
                        .route("/list/", web::get().to(users::list_users))
                        .service(
                            web::resource("/{id}/")
                                .route(web::get().to(users::get_user))
                                .route(web::post().to(users::toggle_follow)),
                        )
                        .route("/{id}/followers/", web::get().to(users::list_followers))
                        .route("/{id}/following/", web::get().to(users::list_following))
                        .route("/{id}/posts/", web::get().to(users::list_user_posts))
                        .route("/{id}/liked-posts/", web::get().to(users::list_liked_posts)),
                )
                .service(
                    web::scope("/social")
                        .service(
                            web::resource("/posts/")
                                .route(web::get().to(posts::list_posts))
                                .route(web::post().to(posts::create_post)),
                        )
                        .service(
                            web::resource("/posts/{id}/")
                                .route(web::get().to(posts::get_post))
                                .route(web::put().to(posts::replace_post))
                                .route(web::patch().to(posts::patch_post))
                                .route(web::delete().to(posts::delete_post)),
                        )
                        .route("/posts/{id}/like/", web::post().to(posts::toggle_like))
                        .service(
                            web::resource("/posts/{post_id}/comments/")
                                .route(web::get().to(comments::list_comments))
                                .route(web::post().to(comments::create_comment)),
                        )
                        .service(
                            web::resource("/posts/{post_id}/comments/{id}/")
                                .route(web::get().to(comments::get_comment))
                                .route(web::put().to(comments::replace_comment))
                                .route(web::patch().to(comments::patch_comment))
                                .route(web::delete().to(comments::delete_comment)),
                        ),
                ),
        );
}
