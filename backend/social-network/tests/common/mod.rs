//! Shared helpers for HTTP-level tests
//!
//! Every test gets its own in-memory store; the JWT secret is process-wide
//! and initialized once.
#![allow(dead_code)]

use std::sync::Once;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::test::{self, TestRequest};
use actix_web::{web, App};
use serde_json::{json, Value};
use uuid::Uuid;

use crypto_core::{jwt, password};
use social_network::middleware::JwtAuthMiddleware;
use social_network::models::NewUser;
use social_network::{configure_routes, Repositories};

pub const PASSWORD: &str = "secret-pass";

static JWT_INIT: Once = Once::new();

pub fn init_jwt() {
    JWT_INIT.call_once(|| {
        jwt::initialize_jwt("integration-test-secret-0123456789abcdef", 3600)
            .expect("initialize jwt");
    });
}

pub async fn init_app(
    repos: Repositories,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    init_jwt();
    test::init_service(
        App::new()
            .app_data(web::Data::new(repos.clone()))
            .wrap(JwtAuthMiddleware::new(repos))
            .configure(configure_routes),
    )
    .await
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

/// Send a request and decode the body as JSON (`Null` when empty)
pub async fn send<S, B>(app: &S, req: TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

pub async fn login<S, B>(app: &S, email: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        TestRequest::post()
            .uri("/api/user/login/")
            .set_json(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().expect("token").to_string()
}

/// Register `name@example.com` through the API and log in
pub async fn signup<S, B>(app: &S, name: &str) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let email = format!("{name}@example.com");
    let (status, body) = send(
        app,
        TestRequest::post().uri("/api/user/register/").set_json(json!({
            "email": email,
            "username": name,
            "password": PASSWORD,
            "first_name": name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

    let id = body["id"].as_str().expect("id").parse().expect("uuid");
    let token = login(app, &email).await;
    TestUser { id, email, token }
}

/// Staff accounts cannot be created over HTTP, so insert one directly
pub async fn staff<S, B>(app: &S, repos: &Repositories, name: &str) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let email = format!("{name}@example.com");
    let user = repos
        .users
        .create_user(NewUser {
            email: email.clone(),
            username: Some(name.to_string()),
            first_name: name.to_string(),
            last_name: String::new(),
            password_hash: password::hash_password(PASSWORD).expect("hash"),
            is_staff: true,
        })
        .await
        .expect("create staff user");

    let token = login(app, &email).await;
    TestUser {
        id: user.id,
        email,
        token,
    }
}

pub async fn create_post<S, B>(app: &S, owner: &TestUser, title: &str, text: &str) -> Uuid
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        TestRequest::post()
            .uri("/api/social/posts/")
            .insert_header(owner.bearer())
            .set_json(json!({ "title": title, "text": text })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");
    body["id"].as_str().expect("id").parse().expect("uuid")
}

pub async fn create_comment<S, B>(app: &S, author: &TestUser, post_id: Uuid, text: &str) -> Uuid
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = send(
        app,
        TestRequest::post()
            .uri(&format!("/api/social/posts/{post_id}/comments/"))
            .insert_header(author.bearer())
            .set_json(json!({ "text": text })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create comment failed: {body}");
    body["id"].as_str().expect("id").parse().expect("uuid")
}
