/// Shared JWT module for the social network services
///
/// Tokens are signed with HS256 using a single shared secret loaded at startup.
/// Every issued token carries a unique `jti` so that individual tokens can be
/// revoked on logout without rotating the secret.
///
/// ## Usage
///
/// ```rust,no_run
/// use crypto_core::jwt;
///
/// let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET required");
/// jwt::initialize_jwt(&secret, 3600).expect("Failed to initialize JWT keys");
/// ```
use crate::{CryptoError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, TokenData,
    Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

const ACCESS_TOKEN_TYPE: &str = "access";

// ============================================================================
// Data Structures
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token identifier, used for revocation
    pub jti: String,
    /// Token type, always "access" for now
    pub token_type: String,
    pub email: String,
    /// Administrator flag at the time the token was issued
    #[serde(default)]
    pub is_staff: bool,
}

/// Token response returned by the login endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
}

// Initialized once at startup and never modified
static JWT_KEYS: OnceCell<JwtKeys> = OnceCell::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the signing secret and access token lifetime.
///
/// Can only be called once; subsequent calls return `AlreadyInitialized`.
pub fn initialize_jwt(secret: &str, access_ttl_secs: i64) -> Result<()> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(CryptoError::WeakSecret {
            min: MIN_SECRET_LEN,
            actual: secret.len(),
        });
    }

    let keys = JwtKeys {
        encoding: EncodingKey::from_secret(secret.as_bytes()),
        decoding: DecodingKey::from_secret(secret.as_bytes()),
        access_ttl_secs,
    };

    JWT_KEYS
        .set(keys)
        .map_err(|_| CryptoError::AlreadyInitialized)
}

fn keys() -> Result<&'static JwtKeys> {
    JWT_KEYS.get().ok_or(CryptoError::NotInitialized)
}

// ============================================================================
// Token Generation
// ============================================================================

/// Generate a new access token for a user
pub fn generate_access_token(user_id: Uuid, email: &str, is_staff: bool) -> Result<TokenResponse> {
    let keys = keys()?;
    let now = Utc::now();
    let expiry = now + Duration::seconds(keys.access_ttl_secs);

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        jti: Uuid::new_v4().to_string(),
        token_type: ACCESS_TOKEN_TYPE.to_string(),
        email: email.to_string(),
        is_staff,
    };

    let token = encode(&Header::new(JWT_ALGORITHM), &claims, &keys.encoding)
        .map_err(|e| CryptoError::TokenGeneration(e.to_string()))?;

    Ok(TokenResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: keys.access_ttl_secs,
    })
}

// ============================================================================
// Token Validation
// ============================================================================

/// Validate and decode an access token.
///
/// Checks the HS256 signature and expiration. Tokens of any other type are
/// rejected.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let keys = keys()?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;
    validation.leeway = 0;

    let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => CryptoError::TokenExpired,
        _ => CryptoError::InvalidToken(e.to_string()),
    })?;

    if data.claims.token_type != ACCESS_TOKEN_TYPE {
        return Err(CryptoError::InvalidToken(format!(
            "unexpected token type '{}'",
            data.claims.token_type
        )));
    }

    Ok(data)
}
