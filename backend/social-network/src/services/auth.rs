/// Registration, login, logout and token resolution
use chrono::{DateTime, TimeZone, Utc};
use crypto_core::jwt::{self, TokenResponse};
use crypto_core::password;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{AuthenticatedUser, NewUser, User};
use crate::repository::Repositories;

const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone)]
pub struct AuthService {
    repos: Repositories,
}

impl AuthService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Create a regular (non-staff) account
    pub async fn register(&self, registration: Registration) -> Result<User> {
        let password_hash = password::hash_password(&registration.password)?;

        let user = self
            .repos
            .users
            .create_user(NewUser {
                email: registration.email.trim().to_string(),
                username: registration.username.filter(|u| !u.is_empty()),
                first_name: registration.first_name,
                last_name: registration.last_name,
                password_hash,
                is_staff: false,
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check credentials and issue an access token
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenResponse)> {
        let user = self
            .repos
            .users
            .find_user_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::Validation(INVALID_CREDENTIALS.to_string()))?;

        if !password::verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(AppError::Validation(INVALID_CREDENTIALS.to_string()));
        }

        let token = jwt::generate_access_token(user.id, &user.email, user.is_staff)?;
        self.repos.users.record_login(user.id, Utc::now()).await?;

        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    /// Revoke the token the caller authenticated with
    pub async fn logout(&self, auth: &AuthenticatedUser) -> Result<()> {
        self.repos
            .revoked_tokens
            .revoke(&auth.token_id, auth.user_id, auth.token_expires_at)
            .await?;
        info!(user_id = %auth.user_id, "user logged out");
        Ok(())
    }

    /// Resolve a bearer token into the user it belongs to.
    ///
    /// Rejects invalid, expired and revoked tokens as well as tokens of deleted
    /// users, and stamps `last_request` on success.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = jwt::validate_token(token)?.claims;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))?;

        if self.repos.revoked_tokens.is_revoked(&claims.jti).await? {
            return Err(AppError::Authentication("Token has been revoked".to_string()));
        }

        let user = self
            .repos
            .users
            .record_request(user_id, Utc::now())
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

        Ok(AuthenticatedUser {
            user_id: user.id,
            email: user.email,
            // staff status is read fresh, not trusted from the token
            is_staff: user.is_staff,
            token_id: claims.jti,
            token_expires_at: expiry(claims.exp),
        })
    }
}

fn expiry(exp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(exp, 0).single().unwrap_or_else(Utc::now)
}
