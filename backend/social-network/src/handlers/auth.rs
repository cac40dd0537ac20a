/// Registration and session endpoints
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::DetailResponse;
use crate::error::Result;
use crate::models::AuthenticatedUser;
use crate::repository::Repositories;
use crate::services::{AuthService, Registration};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    #[validate(length(min = 5, message = "Ensure this field has at least 5 characters."))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub is_staff: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/user/register/",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email or username taken")
    )
)]
pub async fn register(
    repos: web::Data<Repositories>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let req = req.into_inner();

    let user = AuthService::new(repos.get_ref().clone())
        .register(Registration {
            email: req.email,
            username: req.username,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
        })
        .await?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        id: user.id,
        email: user.email,
        username: user.username,
        is_staff: user.is_staff,
    }))
}

/// Exchange email and password for an access token
#[utoipa::path(
    post,
    path = "/api/user/login/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Unable to log in with provided credentials")
    )
)]
pub async fn login(
    repos: web::Data<Repositories>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let (_, token) = AuthService::new(repos.get_ref().clone())
        .login(&req.email, &req.password)
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: token.token,
        token_type: token.token_type,
        expires_in: token.expires_in,
    }))
}

/// Revoke the token used for this request
#[utoipa::path(
    post,
    path = "/api/user/logout/",
    tag = "auth",
    responses(
        (status = 200, description = "Token revoked", body = DetailResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    repos: web::Data<Repositories>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse> {
    AuthService::new(repos.get_ref().clone()).logout(&auth).await?;
    Ok(HttpResponse::Ok().json(DetailResponse::new("Logged out successfully")))
}
