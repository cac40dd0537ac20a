mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use common::{create_post, init_app, send, signup, staff};
use social_network::config::SchedulerConfig;
use social_network::jobs::run_due_jobs;
use social_network::Repositories;

#[actix_web::test]
async fn anonymous_callers_get_restricted_posts() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;

    let (status, body) = send(&app, TestRequest::get().uri("/api/social/posts/")).await;
    assert_eq!(status, StatusCode::OK);
    let item = &body[0];
    let mut keys: Vec<&str> = item
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["owner", "text", "title"]);
    assert_eq!(item["owner"]["username"], "alice");

    let (status, body) = send(
        &app,
        TestRequest::get().uri(&format!("/api/social/posts/{post_id}/")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("id").is_none());
    assert!(body.get("likes_count").is_none());
}

#[actix_web::test]
async fn signed_in_callers_get_full_posts() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;

    let (status, body) = send(
        &app,
        TestRequest::get()
            .uri(&format!("/api/social/posts/{post_id}/"))
            .insert_header(alice.bearer()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], post_id.to_string());
    assert_eq!(body["likes_count"], 0);
    assert_eq!(body["is_updated"], false);
    assert_eq!(body["owner"]["id"], alice.id.to_string());
    assert_eq!(body["url"], format!("/api/social/posts/{post_id}/"));
    assert_eq!(body["like"], format!("/api/social/posts/{post_id}/like/"));
}

#[actix_web::test]
async fn anonymous_writes_are_unauthorized() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;

    let (status, _) = send(
        &app,
        TestRequest::post()
            .uri("/api/social/posts/")
            .set_json(json!({ "title": "Nope", "text": "Nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        TestRequest::patch()
            .uri(&format!("/api/social/posts/{post_id}/"))
            .set_json(json!({ "title": "Nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        TestRequest::delete().uri(&format!("/api/social/posts/{post_id}/")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        TestRequest::post().uri(&format!("/api/social/posts/{post_id}/like/")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn search_is_case_insensitive_over_title_and_text() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    create_post(&app, &alice, "A Test title", "body").await;
    create_post(&app, &alice, "Other", "we are TESTING things").await;
    create_post(&app, &alice, "Unrelated", "nothing here").await;

    let (status, body) = send(
        &app,
        TestRequest::get()
            .uri("/api/social/posts/?search=tEst")
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|p| p["title"].as_str())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"A Test title"));
    assert!(titles.contains(&"Other"));

    let (_, body) = send(
        &app,
        TestRequest::get()
            .uri("/api/social/posts/?search=")
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(body.as_array().map(Vec::len), Some(3));
}

#[actix_web::test]
async fn only_the_owner_can_edit() {
    let repos = Repositories::in_memory();
    let app = init_app(repos.clone()).await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;

    let (status, body) = send(
        &app,
        TestRequest::put()
            .uri(&format!("/api/social/posts/{post_id}/"))
            .insert_header(bob.bearer())
            .set_json(json!({ "title": "Hijacked", "text": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "You do not have permission to perform this action.");

    let (status, body) = send(
        &app,
        TestRequest::patch()
            .uri(&format!("/api/social/posts/{post_id}/"))
            .insert_header(alice.bearer())
            .set_json(json!({ "title": "Hello again" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Hello again");
    assert_eq!(body["text"], "First post");
    assert_eq!(body["is_updated"], true);

    // staff may delete but not edit
    let admin = staff(&app, &repos, "admin").await;
    let (status, _) = send(
        &app,
        TestRequest::patch()
            .uri(&format!("/api/social/posts/{post_id}/"))
            .insert_header(admin.bearer())
            .set_json(json!({ "title": "Moderated" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn owner_or_staff_can_delete() {
    let repos = Repositories::in_memory();
    let app = init_app(repos.clone()).await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let admin = staff(&app, &repos, "admin").await;
    let first = create_post(&app, &alice, "One", "One").await;
    let second = create_post(&app, &alice, "Two", "Two").await;

    let (status, _) = send(
        &app,
        TestRequest::delete()
            .uri(&format!("/api/social/posts/{first}/"))
            .insert_header(bob.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        TestRequest::delete()
            .uri(&format!("/api/social/posts/{first}/"))
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        TestRequest::delete()
            .uri(&format!("/api/social/posts/{second}/"))
            .insert_header(admin.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        TestRequest::get()
            .uri(&format!("/api/social/posts/{first}/"))
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn liking_twice_restores_the_count() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;
    let like_uri = format!("/api/social/posts/{post_id}/like/");
    let post_uri = format!("/api/social/posts/{post_id}/");

    let (status, body) = send(
        &app,
        TestRequest::post().uri(&like_uri).insert_header(bob.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);

    let (_, body) = send(
        &app,
        TestRequest::get().uri(&post_uri).insert_header(bob.bearer()),
    )
    .await;
    assert_eq!(body["likes_count"], 1);

    let (_, body) = send(
        &app,
        TestRequest::get()
            .uri(&format!("/api/user/{}/liked-posts/", bob.id))
            .insert_header(bob.bearer()),
    )
    .await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, body) = send(
        &app,
        TestRequest::post().uri(&like_uri).insert_header(bob.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], false);

    let (_, body) = send(
        &app,
        TestRequest::get().uri(&post_uri).insert_header(bob.bearer()),
    )
    .await;
    assert_eq!(body["likes_count"], 0);
}

#[actix_web::test]
async fn missing_posts_are_not_found() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let missing = Uuid::new_v4();

    let (status, _) = send(
        &app,
        TestRequest::get().uri(&format!("/api/social/posts/{missing}/")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        TestRequest::post()
            .uri(&format!("/api/social/posts/{missing}/like/"))
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        TestRequest::delete()
            .uri(&format!("/api/social/posts/{missing}/"))
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn scheduled_post_is_accepted_and_published_later() {
    let repos = Repositories::in_memory();
    let app = init_app(repos.clone()).await;
    let alice = signup(&app, "alice").await;
    let run_at = Utc::now() + Duration::hours(1);

    let (status, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/social/posts/")
            .insert_header(alice.bearer())
            .set_json(json!({
                "title": "Later",
                "text": "See you in an hour",
                "scheduled_time": run_at.to_rfc3339(),
            })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    assert_eq!(body["status"], "pending");

    let (_, body) = send(&app, TestRequest::get().uri("/api/social/posts/")).await;
    assert_eq!(body.as_array().map(Vec::len), Some(0));

    let config = SchedulerConfig {
        enabled: true,
        poll_interval_secs: 1,
        batch_size: 10,
        max_attempts: 3,
    };
    let summary = run_due_jobs(&repos, &config, run_at + Duration::seconds(1))
        .await
        .expect("run jobs");
    assert_eq!(summary.created, 1);

    let (_, body) = send(
        &app,
        TestRequest::get()
            .uri("/api/social/posts/")
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(body[0]["title"], "Later");
    assert_eq!(body[0]["owner"]["id"], alice.id.to_string());
}

#[actix_web::test]
async fn bad_scheduled_times_are_rejected() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/social/posts/")
            .insert_header(alice.bearer())
            .set_json(json!({
                "title": "Past",
                "text": "Too late",
                "scheduled_time": "2001-01-01T00:00:00Z",
            })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Scheduled time must be in the future.");

    let (status, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/social/posts/")
            .insert_header(alice.bearer())
            .set_json(json!({
                "title": "Garbage",
                "text": "Unparseable",
                "scheduled_time": "next tuesday",
            })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid scheduled time format.");
}

#[actix_web::test]
async fn permissions_are_checked_before_the_body() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;
    let uri = format!("/api/social/posts/{post_id}/");

    let (status, _) = send(
        &app,
        TestRequest::post()
            .uri("/api/social/posts/")
            .set_json(json!({ "title": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        TestRequest::patch().uri(&uri).set_json(json!({ "title": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for req in [
        TestRequest::patch().set_json(json!({ "title": "" })),
        TestRequest::put().set_json(json!({ "text": "no title" })),
    ] {
        let (status, _) = send(&app, req.uri(&uri).insert_header(bob.bearer())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // the owner gets the validation error
    for req in [
        TestRequest::patch().set_json(json!({ "title": "" })),
        TestRequest::put().set_json(json!({ "text": "no title" })),
    ] {
        let (status, body) = send(&app, req.uri(&uri).insert_header(alice.bearer())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    let (status, _) = send(
        &app,
        TestRequest::post()
            .uri("/api/social/posts/")
            .insert_header(alice.bearer())
            .set_json(json!({ "title": "No text" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn empty_patch_leaves_post_unedited() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;

    let (status, body) = send(
        &app,
        TestRequest::patch()
            .uri(&format!("/api/social/posts/{post_id}/"))
            .insert_header(alice.bearer())
            .set_json(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Hello");
    assert_eq!(body["is_updated"], false);
}

#[actix_web::test]
async fn put_without_content_clears_it() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;

    let (status, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/social/posts/")
            .insert_header(alice.bearer())
            .set_json(json!({ "title": "Pic", "text": "See", "content": "uploads/a.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"], "uploads/a.png");
    let uri = format!("/api/social/posts/{}/", body["id"].as_str().expect("id"));

    // PATCH without content keeps it
    let (_, body) = send(
        &app,
        TestRequest::patch()
            .uri(&uri)
            .insert_header(alice.bearer())
            .set_json(json!({ "text": "Look" })),
    )
    .await;
    assert_eq!(body["content"], "uploads/a.png");

    let (status, body) = send(
        &app,
        TestRequest::put()
            .uri(&uri)
            .insert_header(alice.bearer())
            .set_json(json!({ "title": "Pic", "text": "Gone" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["content"].is_null());
    assert_eq!(body["is_updated"], true);
}
