mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::json;
use uuid::Uuid;

use common::{create_comment, create_post, init_app, send, signup, staff};
use social_network::Repositories;

#[actix_web::test]
async fn comments_require_authentication() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;
    let uri = format!("/api/social/posts/{post_id}/comments/");

    let (status, _) = send(&app, TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        TestRequest::post().uri(&uri).set_json(json!({ "text": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn comment_is_listed_under_its_post() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;
    let comment_id = create_comment(&app, &bob, post_id, "Nice one").await;

    let (status, body) = send(
        &app,
        TestRequest::get()
            .uri(&format!("/api/social/posts/{post_id}/comments/"))
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], comment_id.to_string());
    assert_eq!(body[0]["text"], "Nice one");
    assert_eq!(body[0]["owner"]["username"], "bob");
    assert_eq!(body[0]["post"], format!("/api/social/posts/{post_id}/"));
}

#[actix_web::test]
async fn only_the_author_can_edit_a_comment() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;
    let comment_id = create_comment(&app, &bob, post_id, "Nice one").await;
    let uri = format!("/api/social/posts/{post_id}/comments/{comment_id}/");

    // owning the post is not enough to edit someone's comment
    let (status, _) = send(
        &app,
        TestRequest::put()
            .uri(&uri)
            .insert_header(alice.bearer())
            .set_json(json!({ "text": "Edited by alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        TestRequest::patch()
            .uri(&uri)
            .insert_header(bob.bearer())
            .set_json(json!({ "text": "Very nice one" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Very nice one");
    assert_eq!(body["is_updated"], true);
}

#[actix_web::test]
async fn comment_delete_permissions() {
    let repos = Repositories::in_memory();
    let app = init_app(repos.clone()).await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let carol = signup(&app, "carol").await;
    let admin = staff(&app, &repos, "admin").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;

    let by_author = create_comment(&app, &bob, post_id, "one").await;
    let by_post_owner = create_comment(&app, &bob, post_id, "two").await;
    let by_staff = create_comment(&app, &bob, post_id, "three").await;
    let uri = |id: Uuid| format!("/api/social/posts/{post_id}/comments/{id}/");

    // neither author, post owner nor staff
    let (status, _) = send(
        &app,
        TestRequest::delete()
            .uri(&uri(by_author))
            .insert_header(carol.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for (comment_id, caller) in [(by_author, &bob), (by_post_owner, &alice), (by_staff, &admin)] {
        let (status, _) = send(
            &app,
            TestRequest::delete()
                .uri(&uri(comment_id))
                .insert_header(caller.bearer()),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT, "{}", caller.email);
    }

    let (_, body) = send(
        &app,
        TestRequest::get()
            .uri(&format!("/api/social/posts/{post_id}/comments/"))
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn comments_are_scoped_to_their_post() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let first = create_post(&app, &alice, "One", "One").await;
    let second = create_post(&app, &alice, "Two", "Two").await;
    let comment_id = create_comment(&app, &alice, first, "on the first").await;

    let (status, _) = send(
        &app,
        TestRequest::get()
            .uri(&format!("/api/social/posts/{second}/comments/{comment_id}/"))
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        TestRequest::post()
            .uri(&format!("/api/social/posts/{}/comments/", Uuid::new_v4()))
            .insert_header(alice.bearer())
            .set_json(json!({ "text": "orphan" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deleting_a_post_removes_its_comments() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;
    let comment_id = create_comment(&app, &alice, post_id, "soon gone").await;

    let (status, _) = send(
        &app,
        TestRequest::delete()
            .uri(&format!("/api/social/posts/{post_id}/"))
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        TestRequest::get()
            .uri(&format!("/api/social/posts/{post_id}/comments/{comment_id}/"))
            .insert_header(alice.bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn comment_permissions_are_checked_before_the_body() {
    let app = init_app(Repositories::in_memory()).await;
    let alice = signup(&app, "alice").await;
    let bob = signup(&app, "bob").await;
    let post_id = create_post(&app, &alice, "Hello", "First post").await;
    let comment_id = create_comment(&app, &bob, post_id, "Nice one").await;
    let list_uri = format!("/api/social/posts/{post_id}/comments/");
    let uri = format!("{list_uri}{comment_id}/");

    let (status, _) = send(
        &app,
        TestRequest::post().uri(&list_uri).set_json(json!({ "text": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        TestRequest::put()
            .uri(&uri)
            .insert_header(alice.bearer())
            .set_json(json!({ "text": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for req in [
        TestRequest::put().uri(&uri).set_json(json!({ "text": "" })),
        TestRequest::post().uri(&list_uri).set_json(json!({})),
    ] {
        let (status, body) = send(&app, req.insert_header(bob.bearer())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}
